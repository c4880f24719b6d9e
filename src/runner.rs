//! Dispatches a parsed command to its state module and shapes the
//! result into the JSON report printed on stdout.

use crate::cli::{Cli, Command};
use clap::CommandFactory;
use clap_complete::generate;
use ghkit::{
    BranchModule, BranchSpec, CollaboratorModule, CollaboratorSpec, FileModule, FileSpec,
    GithubClient, LabelModule, LabelSpec, RepositoryModule, RepositorySpec, SecretModule,
    SecretSpec,
};
use reconcile::{Error, Outcome, Result, StateModule};
use serde_json::{Map, Value, json};
use std::io;

/// Execute one invocation. `Ok(None)` means the command produced its own
/// output and there is no report to print.
pub fn run(cli: Cli) -> Result<Option<Value>> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "octoset", &mut io::stdout());
        return Ok(None);
    }

    let Some(token) = cli.token else {
        return Err(Error::validation(
            "token",
            "pass --token or set GITHUB_TOKEN",
        ));
    };
    let client = GithubClient::new(token, &cli.api_url);
    let check = cli.check;

    match cli.command {
        Command::Repository(args) => {
            let spec = RepositorySpec {
                name: args.name,
                description: args.description,
                homepage: args.homepage,
                private: args.private,
                has_issues: args.has_issues,
                has_wiki: args.has_wiki,
                has_projects: args.has_projects,
                has_downloads: args.has_downloads,
                allow_merge_commit: args.allow_merge_commit,
                allow_squash_merge: args.allow_squash_merge,
                allow_rebase_merge: args.allow_rebase_merge,
                delete_branch_on_merge: args.delete_branch_on_merge,
                auto_init: args.auto_init,
                gitignore_template: args.gitignore_template,
                license_template: args.license_template,
                clear: args.clear,
            };
            let module = RepositoryModule::new(client, args.owner, args.organization, &spec)?;
            report(&module, args.state.as_str(), check, "repository")
        }
        Command::Label(args) => {
            let spec = LabelSpec {
                name: args.name,
                color: args.color,
                description: args.description,
                clear: args.clear,
            };
            let module = LabelModule::new(client, args.target.owner, args.target.repo, &spec)?;
            report(&module, args.state.as_str(), check, "label")
        }
        Command::Branch(args) => {
            let spec = BranchSpec {
                name: args.name,
                source: args.source,
            };
            let module = BranchModule::new(client, args.target.owner, args.target.repo, &spec)?;
            report(&module, args.state.as_str(), check, "branch")
        }
        Command::File(args) => {
            let spec = FileSpec {
                path: args.path,
                content: args.content,
                src: args.src,
                branch: args.branch,
                message: args.message,
            };
            let module = FileModule::new(client, args.target.owner, args.target.repo, &spec)?;
            report(&module, args.state.as_str(), check, "file")
        }
        Command::Collaborator(args) => {
            let spec = CollaboratorSpec {
                username: args.username,
                permission: args.permission,
            };
            let module =
                CollaboratorModule::new(client, args.target.owner, args.target.repo, &spec)?;
            report(&module, args.state.as_str(), check, "collaborator")
        }
        Command::Secret(args) => {
            let spec = SecretSpec {
                name: args.name,
                value: args.value,
            };
            let module = SecretModule::new(client, args.target.owner, args.target.repo, &spec)?;
            report(&module, args.state.as_str(), check, "secret")
        }
        Command::Completions { .. } => Ok(None),
    }
}

fn report<M: StateModule>(
    module: &M,
    state: &str,
    check_mode: bool,
    key: &str,
) -> Result<Option<Value>> {
    let outcome = module.apply(state, check_mode)?;
    Ok(Some(render(outcome, key)))
}

fn render(outcome: Outcome, key: &str) -> Value {
    let mut report = Map::new();
    report.insert("changed".to_string(), Value::Bool(outcome.changed));
    report.insert(key.to_string(), outcome.resource.unwrap_or(Value::Null));
    if let Some(msg) = outcome.message {
        report.insert("msg".to_string(), Value::String(msg));
    }
    Value::Object(report)
}

/// Failure report, mirroring the success shape.
pub fn failure(err: &Error) -> Value {
    json!({"failed": true, "msg": err.to_string()})
}
