use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "personachat")]
#[command(
    about = "Persona chat assistant for a personal website",
    long_about = "Persona chat assistant for a personal website\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/personachat/config.toml\n    2. ~/.config/personachat/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log redacted HTTP requests and responses to stderr.
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn parse_defaults() {
        let args = CliArgs::try_parse_from(["personachat"]).expect("should parse");
        assert_eq!(args.config, None);
        assert!(!args.verbose);
    }

    #[test]
    fn parse_config_and_verbose_flags() {
        let args =
            CliArgs::try_parse_from(["personachat", "--config", "/tmp/custom.toml", "--verbose"])
                .expect("parse");
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("/tmp/custom.toml"))
        );
        assert!(args.verbose);
    }
}
