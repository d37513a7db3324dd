//! Command-line configuration for the extension server.

use clap::{Parser, ValueEnum};
use ember_rpc::IdParity;

/// CLI arguments.
///
/// The host spawns the server with the protocol on stdin/stdout, so every
/// knob lives on the command line; there is no interactive configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ember-server",
    about = "Editor extension server speaking the ember RPC protocol on stdio",
    version
)]
pub struct Cli {
    /// Tracing filter expression (e.g. `info`, `ember_rpc=debug`).
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Log output format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Which half of the correlation-id space this side owns. The host must
    /// own the other half.
    #[arg(long, value_enum, default_value_t = Parity::Even)]
    pub id_parity: Parity,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Compact,
    /// Structured JSON lines.
    Json,
}

/// Correlation-id parity, as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Parity {
    /// Even ids (2, 4, 6, …), the conventional extension side.
    Even,
    /// Odd ids (1, 3, 5, …).
    Odd,
}

impl From<Parity> for IdParity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::Even => Self::Even,
            Parity::Odd => Self::Odd,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_are_stdio_friendly() {
        let cli = Cli::parse_from(["ember-server"]);
        assert_eq!(cli.log_filter, "info");
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert_eq!(cli.id_parity, Parity::Even);
    }

    #[rstest]
    #[case(Parity::Even, IdParity::Even)]
    #[case(Parity::Odd, IdParity::Odd)]
    fn parity_maps_onto_the_allocator(#[case] cli: Parity, #[case] expected: IdParity) {
        assert_eq!(IdParity::from(cli), expected);
    }

    #[test]
    fn parity_flag_parses() {
        let cli = Cli::parse_from(["ember-server", "--id-parity", "odd"]);
        assert_eq!(cli.id_parity, Parity::Odd);
    }
}
