//! Files written into the repository by `replybot deploy`.

use anyhow::Context;
use minijinja::Environment;
use serde::Serialize;

const README_TEMPLATE: &str = include_str!("templates/readme.md.jinja");
const WORKFLOW_TEMPLATE: &str = include_str!("templates/workflow.yml.jinja");

/// Static `.gitignore` for a bot checkout.
pub const GITIGNORE: &str = include_str!("templates/gitignore.txt");

/// Context data passed to templates
#[derive(Debug, Serialize)]
pub struct DeployContext {
    /// Repository name
    pub repo: String,
    /// Branch the workflow runs on
    pub branch: String,
    /// Actions secret holding the bot token
    pub secret: String,
}

fn render(name: &str, source: &str, ctx: &DeployContext) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template(name, source)
        .with_context(|| format!("loading template {name}"))?;
    env.get_template(name)?
        .render(ctx)
        .with_context(|| format!("rendering template {name}"))
}

pub fn render_readme(ctx: &DeployContext) -> anyhow::Result<String> {
    render("README.md", README_TEMPLATE, ctx)
}

pub fn render_workflow(ctx: &DeployContext) -> anyhow::Result<String> {
    render("workflow.yml", WORKFLOW_TEMPLATE, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DeployContext {
        DeployContext {
            repo: "telegram-bot".to_string(),
            branch: "main".to_string(),
            secret: "BOT_TOKEN".to_string(),
        }
    }

    #[test]
    fn readme_names_repo_and_branch() {
        let readme = render_readme(&ctx()).unwrap();
        assert!(readme.starts_with("# telegram-bot\n"));
        assert!(readme.contains("push to the main branch"));
        assert!(readme.ends_with('\n'));
    }

    #[test]
    fn workflow_references_secret_expression() {
        let workflow = render_workflow(&ctx()).unwrap();
        assert!(workflow.contains("branches: [main]"));
        assert!(workflow.contains("BOT_TOKEN: ${{ secrets.BOT_TOKEN }}"));
        assert!(workflow.contains("workflow_dispatch"));
    }

    #[test]
    fn gitignore_excludes_env_file() {
        assert!(GITIGNORE.lines().any(|l| l == ".env"));
        assert!(GITIGNORE.lines().any(|l| l == "/target/"));
    }
}
