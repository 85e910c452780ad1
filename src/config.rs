//! Command line and environment configuration.

use clap::Parser;

use crate::agent::{DEFAULT_MAX_STEPS, DEFAULT_REVIEW_PROMPT};
use crate::llm::{Provider, ProviderSelection};

/// Review local git changes with an LLM agent.
#[derive(Parser, Debug, Clone)]
#[command(name = "diffwise")]
#[command(about = "Review local git changes with an LLM agent")]
#[command(version)]
pub struct Cli {
    /// What to ask the agent. Defaults to a full review of the current directory.
    pub prompt: Option<String>,

    /// LLM provider to try first; the other one is the fallback
    #[arg(long, value_enum, env = "DIFFWISE_PROVIDER", default_value_t = Provider::Claude)]
    pub provider: Provider,

    /// Maximum number of model calls in one session
    #[arg(
        long,
        env = "DIFFWISE_MAX_STEPS",
        default_value_t = DEFAULT_MAX_STEPS,
        value_parser = parse_max_steps
    )]
    pub max_steps: usize,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_max_steps(value: &str) -> Result<usize, String> {
    let steps: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", value))?;
    if steps == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(steps)
}

/// Settings for one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub prompt: String,
    pub providers: ProviderSelection,
    pub max_steps: usize,
    pub verbose: bool,
}

impl AgentConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let prompt = cli
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEW_PROMPT.to_string());

        Self {
            prompt,
            providers: ProviderSelection::from_primary(cli.provider),
            max_steps: cli.max_steps,
            verbose: cli.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("diffwise").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(["DIFFWISE_PROVIDER", "DIFFWISE_MAX_STEPS"], || {
            let config = AgentConfig::from_cli(parse(&[]).unwrap());
            assert_eq!(config.prompt, DEFAULT_REVIEW_PROMPT);
            assert_eq!(config.providers, ProviderSelection::default());
            assert_eq!(config.max_steps, 10);
            assert!(!config.verbose);
        });
    }

    #[test]
    fn test_prompt_argument_overrides_default() {
        temp_env::with_vars_unset(["DIFFWISE_PROVIDER", "DIFFWISE_MAX_STEPS"], || {
            let config = AgentConfig::from_cli(parse(&["only review src/"]).unwrap());
            assert_eq!(config.prompt, "only review src/");
        });
    }

    #[test]
    fn test_blank_prompt_uses_default() {
        temp_env::with_vars_unset(["DIFFWISE_PROVIDER", "DIFFWISE_MAX_STEPS"], || {
            let config = AgentConfig::from_cli(parse(&["   "]).unwrap());
            assert_eq!(config.prompt, DEFAULT_REVIEW_PROMPT);
        });
    }

    #[test]
    fn test_provider_from_env() {
        temp_env::with_var("DIFFWISE_PROVIDER", Some("codex"), || {
            let config = AgentConfig::from_cli(parse(&[]).unwrap());
            assert_eq!(config.providers.primary, Provider::Codex);
            assert_eq!(config.providers.fallback, Provider::Claude);
        });
    }

    #[test]
    fn test_flag_beats_env() {
        temp_env::with_var("DIFFWISE_MAX_STEPS", Some("4"), || {
            let cli = parse(&["--max-steps", "7"]).unwrap();
            assert_eq!(cli.max_steps, 7);
        });
    }

    #[test]
    fn test_max_steps_from_env() {
        temp_env::with_var("DIFFWISE_MAX_STEPS", Some("3"), || {
            assert_eq!(parse(&[]).unwrap().max_steps, 3);
        });
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        temp_env::with_var_unset("DIFFWISE_MAX_STEPS", || {
            assert!(parse(&["--max-steps", "0"]).is_err());
            assert!(parse(&["--max-steps", "many"]).is_err());
        });
    }

    #[test]
    fn test_verbose_flag() {
        temp_env::with_vars_unset(["DIFFWISE_PROVIDER", "DIFFWISE_MAX_STEPS"], || {
            assert!(parse(&["-v"]).unwrap().verbose);
        });
    }
}
