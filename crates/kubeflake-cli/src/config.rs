use core::{fmt, str::FromStr, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use kubeflake::{
    BoxError, Codec, DEFAULT_CLUSTER_BITS, DEFAULT_EPOCH, DEFAULT_MACHINE_BITS,
    DEFAULT_SEQUENCE_BITS, EnvProvider, IdProvider, Layout, Settings, StaticId,
};
use kubeflake_discovery::{CloudZoneProvider, StatefulSetOrdinal};

const DEFAULT_EPOCH_MS: u64 =
    DEFAULT_EPOCH.as_secs() * 1_000 + DEFAULT_EPOCH.subsec_millis() as u64;

/// Command-line options for the `kubeflake` binary.
///
/// Layout options apply to every subcommand and must match the layout the
/// ids were minted with when composing or decomposing. Each one falls back to
/// a `KUBEFLAKE_*` environment variable, which may also come from a `.env`
/// file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kubeflake",
    version,
    about = "Mint and inspect cluster-aware 64-bit ids"
)]
pub struct CliArgs {
    /// Bits for the per-tick sequence number.
    ///
    /// Environment variable: `KUBEFLAKE_SEQUENCE_BITS`
    #[arg(long, global = true, env = "KUBEFLAKE_SEQUENCE_BITS", default_value_t = DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u8,

    /// Bits for the cluster id.
    ///
    /// Environment variable: `KUBEFLAKE_CLUSTER_BITS`
    #[arg(long, global = true, env = "KUBEFLAKE_CLUSTER_BITS", default_value_t = DEFAULT_CLUSTER_BITS)]
    pub cluster_bits: u8,

    /// Bits for the machine id.
    ///
    /// Environment variable: `KUBEFLAKE_MACHINE_BITS`
    #[arg(long, global = true, env = "KUBEFLAKE_MACHINE_BITS", default_value_t = DEFAULT_MACHINE_BITS)]
    pub machine_bits: u8,

    /// Length of one tick in milliseconds. `0` selects the default of 10 ms.
    ///
    /// Environment variable: `KUBEFLAKE_TIME_UNIT_MS`
    #[arg(long, global = true, env = "KUBEFLAKE_TIME_UNIT_MS", default_value_t = 0)]
    pub time_unit_ms: u64,

    /// Start of the time field, in milliseconds since the Unix epoch.
    ///
    /// Environment variable: `KUBEFLAKE_EPOCH_MS`
    #[arg(long, global = true, env = "KUBEFLAKE_EPOCH_MS", default_value_t = DEFAULT_EPOCH_MS)]
    pub epoch_ms: u64,

    /// Alphabet used for keys.
    ///
    /// Environment variable: `KUBEFLAKE_CODEC`
    #[arg(long, global = true, env = "KUBEFLAKE_CODEC", value_enum, default_value_t = CodecArg::Base62)]
    pub codec: CodecArg,

    /// Where the cluster id comes from: `static:<n>`, `env:<VAR>[,<VAR>...]`,
    /// `gcp` or `aws`.
    ///
    /// Environment variable: `KUBEFLAKE_CLUSTER_ID`
    #[arg(long, global = true, env = "KUBEFLAKE_CLUSTER_ID", default_value = "static:0")]
    pub cluster_id: IdSource,

    /// Where the machine id comes from: `static:<n>`, `env:<VAR>[,<VAR>...]`
    /// or `statefulset`.
    ///
    /// Environment variable: `KUBEFLAKE_MACHINE_ID`
    #[arg(long, global = true, env = "KUBEFLAKE_MACHINE_ID", default_value = "static:0")]
    pub machine_id: IdSource,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mint new ids and print one per line.
    Next {
        /// How many ids to mint.
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,

        /// Print keys instead of numeric ids.
        #[arg(long)]
        keys: bool,
    },

    /// Build an id from its four parts.
    Compose {
        /// Instant in milliseconds since the Unix epoch.
        #[arg(long)]
        at_millis: u64,

        #[arg(long, default_value_t = 0)]
        sequence: u64,

        #[arg(long, default_value_t = 0)]
        machine: u64,

        #[arg(long, default_value_t = 0)]
        cluster: u64,

        /// Print the key instead of the numeric id.
        #[arg(long)]
        key: bool,
    },

    /// Break an id, or a key with `--key`, into its parts.
    Decompose {
        #[arg(required_unless_present = "key", conflicts_with = "key")]
        id: Option<u64>,

        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecArg {
    Base62,
    Base64,
}

impl From<CodecArg> for Codec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Base62 => Self::Base62,
            CodecArg::Base64 => Self::Base64,
        }
    }
}

/// A cluster-id or machine-id source given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    Static(u64),
    Env(Vec<String>),
    Gcp,
    Aws,
    StatefulSet,
}

impl FromStr for IdSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("static", value)) => value
                .trim()
                .parse()
                .map(Self::Static)
                .map_err(|e| format!("invalid static id {value:?}: {e}")),
            Some(("env", vars)) => {
                let vars: Vec<String> = vars
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
                    .collect();
                if vars.is_empty() {
                    return Err("`env:` needs at least one variable name".to_owned());
                }
                Ok(Self::Env(vars))
            }
            None if s == "gcp" => Ok(Self::Gcp),
            None if s == "aws" => Ok(Self::Aws),
            None if s == "statefulset" => Ok(Self::StatefulSet),
            _ => Err(format!(
                "unknown id source {s:?} (expected static:<n>, env:<VAR>, gcp, aws or statefulset)"
            )),
        }
    }
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(id) => write!(f, "static:{id}"),
            Self::Env(vars) => write!(f, "env:{}", vars.join(",")),
            Self::Gcp => f.write_str("gcp"),
            Self::Aws => f.write_str("aws"),
            Self::StatefulSet => f.write_str("statefulset"),
        }
    }
}

impl IdProvider for IdSource {
    fn id(&self) -> Result<u64, BoxError> {
        match self {
            Self::Static(id) => StaticId(*id).id(),
            Self::Env(vars) => EnvProvider::new(vars.iter().cloned()).id(),
            Self::Gcp => CloudZoneProvider::gcp().id(),
            Self::Aws => CloudZoneProvider::aws().id(),
            Self::StatefulSet => StatefulSetOrdinal::new().id(),
        }
    }
}

/// Validated runtime configuration.
///
/// Providers are not resolved here: `compose` and `decompose` only need the
/// layout, and cloud lookups should not run for them.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub layout: Layout,
    pub command: Command,
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.cluster_id == IdSource::StatefulSet {
            bail!("KUBEFLAKE_CLUSTER_ID: `statefulset` only identifies machines");
        }
        if matches!(args.machine_id, IdSource::Gcp | IdSource::Aws) {
            bail!(
                "KUBEFLAKE_MACHINE_ID: `{}` only identifies clusters",
                args.machine_id
            );
        }

        let cluster_static = static_value(&args.cluster_id);
        let machine_static = static_value(&args.machine_id);

        let settings = Settings::new(args.cluster_id, args.machine_id)
            .with_sequence_bits(args.sequence_bits)
            .with_cluster_bits(args.cluster_bits)
            .with_machine_bits(args.machine_bits)
            .with_time_unit(Duration::from_millis(args.time_unit_ms))
            .with_epoch(Duration::from_millis(args.epoch_ms))
            .with_codec(args.codec.into());
        let layout = settings.validate().context("invalid id layout")?;

        if let Some(id) = cluster_static.filter(|&id| id > layout.max_cluster_id()) {
            bail!(
                "KUBEFLAKE_CLUSTER_ID ({id}) exceeds the cluster id space (max = {})",
                layout.max_cluster_id()
            );
        }
        if let Some(id) = machine_static.filter(|&id| id > layout.max_machine_id()) {
            bail!(
                "KUBEFLAKE_MACHINE_ID ({id}) exceeds the machine id space (max = {})",
                layout.max_machine_id()
            );
        }

        Ok(Self {
            settings,
            layout,
            command: args.command,
        })
    }
}

const fn static_value(source: &IdSource) -> Option<u64> {
    match source {
        IdSource::Static(id) => Some(*id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(core::iter::once("kubeflake").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_library() {
        let config = Config::try_from(parse(&["next"])).unwrap();
        let defaults = Settings::default().validate().unwrap();
        assert_eq!(config.layout, defaults);
        assert_eq!(config.layout.epoch(), DEFAULT_EPOCH);
        assert_eq!(
            config.command,
            Command::Next {
                count: 1,
                keys: false
            }
        );
    }

    #[test]
    fn id_sources_parse() {
        assert_eq!("static:12".parse::<IdSource>(), Ok(IdSource::Static(12)));
        assert_eq!(
            "env:CLUSTER_ID, FALLBACK".parse::<IdSource>(),
            Ok(IdSource::Env(vec!["CLUSTER_ID".into(), "FALLBACK".into()]))
        );
        assert_eq!("gcp".parse::<IdSource>(), Ok(IdSource::Gcp));
        assert_eq!("aws".parse::<IdSource>(), Ok(IdSource::Aws));
        assert_eq!("statefulset".parse::<IdSource>(), Ok(IdSource::StatefulSet));

        assert!("static:-1".parse::<IdSource>().is_err());
        assert!("env:".parse::<IdSource>().is_err());
        assert!("azure".parse::<IdSource>().is_err());
        assert!("file:/tmp/id".parse::<IdSource>().is_err());
    }

    #[test]
    fn id_sources_display_as_parsed() {
        for s in ["static:3", "env:A,B", "gcp", "aws", "statefulset"] {
            assert_eq!(s.parse::<IdSource>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn layout_options_apply() {
        let config = Config::try_from(parse(&[
            "--sequence-bits",
            "12",
            "--cluster-bits",
            "4",
            "--machine-bits",
            "8",
            "--time-unit-ms",
            "1",
            "--epoch-ms",
            "1700000000000",
            "--codec",
            "base64",
            "decompose",
            "7",
        ]))
        .unwrap();
        let layout = config.layout;
        assert_eq!(layout.time_bits(), 40);
        assert_eq!(layout.time_unit(), Duration::from_millis(1));
        assert_eq!(layout.epoch(), Duration::from_secs(1_700_000_000));
        assert_eq!(layout.codec(), Codec::Base64);
        assert_eq!(
            config.command,
            Command::Decompose {
                id: Some(7),
                key: None
            }
        );
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let args = parse(&["decompose", "--key", "abc", "--machine-bits", "10"]);
        assert_eq!(args.machine_bits, 10);
        assert_eq!(
            args.command,
            Command::Decompose {
                id: None,
                key: Some("abc".into())
            }
        );
    }

    #[test]
    fn decompose_needs_exactly_one_input() {
        let base = ["kubeflake", "decompose"];
        assert!(CliArgs::try_parse_from(base).is_err());
        assert!(CliArgs::try_parse_from(base.into_iter().chain(["1", "--key", "b"])).is_err());
    }

    #[test]
    fn next_rejects_zero_count() {
        assert!(CliArgs::try_parse_from(["kubeflake", "next", "-n", "0"]).is_err());
        let args = parse(&["next", "-n", "5", "--keys"]);
        assert_eq!(args.command, Command::Next { count: 5, keys: true });
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let err = Config::try_from(parse(&["--sequence-bits", "31", "next"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::InvalidSequenceBits { bits: 31 })
        ));
    }

    #[test]
    fn future_epoch_is_rejected() {
        let err = Config::try_from(parse(&["--epoch-ms", &u64::MAX.to_string(), "next"]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::StartTimeAhead)
        ));
    }

    #[test]
    fn static_ids_are_range_checked() {
        let err = Config::try_from(parse(&["--cluster-id", "static:8", "next"])).unwrap_err();
        assert!(err.to_string().contains("cluster id space"), "{err}");

        let err = Config::try_from(parse(&[
            "--machine-bits",
            "3",
            "--machine-id",
            "static:8",
            "next",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("machine id space"), "{err}");

        assert!(Config::try_from(parse(&["--cluster-id", "static:7", "next"])).is_ok());
    }

    #[test]
    fn sources_are_tied_to_their_dimension() {
        assert!(Config::try_from(parse(&["--cluster-id", "statefulset", "next"])).is_err());
        assert!(Config::try_from(parse(&["--machine-id", "gcp", "next"])).is_err());
        assert!(Config::try_from(parse(&["--machine-id", "aws", "next"])).is_err());
        assert!(Config::try_from(parse(&["--machine-id", "statefulset", "next"])).is_ok());
        assert!(Config::try_from(parse(&["--cluster-id", "aws", "next"])).is_ok());
    }

    #[test]
    fn static_source_is_a_provider() {
        assert_eq!(IdSource::Static(5).id().unwrap(), 5);
    }
}
