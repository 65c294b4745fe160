use core::time::Duration;
use std::io::{BufWriter, Write};

use anyhow::Context;
use kubeflake::{KubeflakeGenerator, Layout, Settings};

use crate::config::{Command, Config};

/// Runs the configured subcommand, writing its output to `out`.
pub fn run(config: Config, out: &mut impl Write) -> anyhow::Result<()> {
    match config.command {
        Command::Next { count, keys } => next(config.settings, count, keys, out),
        Command::Compose {
            at_millis,
            sequence,
            machine,
            cluster,
            key,
        } => {
            let time = Duration::from_millis(at_millis);
            let layout = &config.layout;
            if key {
                let key = layout
                    .compose_key(time, sequence, machine, cluster)
                    .context("cannot compose key")?;
                writeln!(out, "{key}")?;
            } else {
                let id = layout
                    .compose(time, sequence, machine, cluster)
                    .context("cannot compose id")?;
                writeln!(out, "{id}")?;
            }
            Ok(())
        }
        Command::Decompose { id, key } => {
            let id = match (id, key) {
                (Some(id), _) => id,
                (None, Some(key)) => config
                    .layout
                    .codec()
                    .decode(&key)
                    .with_context(|| format!("cannot decode key {key:?}"))?,
                (None, None) => anyhow::bail!("nothing to decompose"),
            };
            decompose(&config.layout, id, out)
        }
    }
}

fn next(settings: Settings, count: u64, keys: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let generator = KubeflakeGenerator::new(settings).context("cannot create generator")?;
    tracing::info!(
        cluster_id = generator.cluster_id(),
        machine_id = generator.machine_id(),
        count,
        "minting ids"
    );

    let mut out = BufWriter::new(out);
    for _ in 0..count {
        if keys {
            writeln!(out, "{}", generator.next_key()?)?;
        } else {
            writeln!(out, "{}", generator.next_id()?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn decompose(layout: &Layout, id: u64, out: &mut impl Write) -> anyhow::Result<()> {
    let parts = layout.decompose(id);
    writeln!(out, "{parts}")?;
    write!(out, "{}", layout.describe(id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliArgs;
    use clap::Parser;

    const EPOCH_MS: u64 = 1_700_000_000_000;

    fn run_args(args: &[&str]) -> anyhow::Result<String> {
        let epoch = EPOCH_MS.to_string();
        let argv = ["kubeflake", "--epoch-ms", &epoch, "--time-unit-ms", "1"]
            .into_iter()
            .chain(args.iter().copied());
        let config = Config::try_from(CliArgs::try_parse_from(argv)?)?;
        let mut out = Vec::new();
        run(config, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn next_prints_increasing_ids() {
        let out = run_args(&[
            "--cluster-id",
            "static:5",
            "--machine-id",
            "static:77",
            "next",
            "-n",
            "50",
        ])
        .unwrap();
        let ids: Vec<u64> = out.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(ids.len(), 50);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let layout = Settings::default()
            .with_epoch(Duration::from_millis(EPOCH_MS))
            .with_time_unit(Duration::from_millis(1))
            .validate()
            .unwrap();
        for id in ids {
            let parts = layout.decompose(id);
            assert_eq!(parts.cluster_id, 5);
            assert_eq!(parts.machine_id, 77);
        }
    }

    #[test]
    fn next_prints_keys() {
        let out = run_args(&["--codec", "base64", "next", "-n", "3", "--keys"]).unwrap();
        let keys: Vec<&str> = out.lines().collect();
        assert_eq!(keys.len(), 3);
        for key in keys {
            assert!(kubeflake::Codec::Base64.decode(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn compose_then_decompose() {
        let at = (EPOCH_MS + 42).to_string();
        let out = run_args(&[
            "compose",
            "--at-millis",
            &at,
            "--sequence",
            "7",
            "--machine",
            "11",
            "--cluster",
            "3",
        ])
        .unwrap();
        let id = out.trim().to_owned();

        let out = run_args(&["decompose", &id]).unwrap();
        let first = out.lines().next().unwrap();
        assert_eq!(first, "elapsed=42 sequence=7 cluster_id=3 machine_id=11");
        assert!(out.contains("1700000000.042s since unix epoch"), "{out}");
    }

    #[test]
    fn key_round_trip_matches_id() {
        let at = (EPOCH_MS + 1_000).to_string();
        let compose = |key: bool| {
            let mut args = vec!["compose", "--at-millis", &at, "--sequence", "1"];
            if key {
                args.push("--key");
            }
            run_args(&args).unwrap().trim().to_owned()
        };
        let id = compose(false);
        let key = compose(true);
        assert_eq!(
            run_args(&["decompose", &id]).unwrap(),
            run_args(&["decompose", "--key", &key]).unwrap()
        );
    }

    #[test]
    fn compose_before_epoch_fails() {
        let at = (EPOCH_MS - 1).to_string();
        let err = run_args(&["compose", "--at-millis", &at]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::StartTimeAhead)
        ));
    }

    #[test]
    fn compose_out_of_range_fails() {
        let at = EPOCH_MS.to_string();
        let err = run_args(&["compose", "--at-millis", &at, "--cluster", "8"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::InvalidClusterRange { cluster_id: 8 })
        ));
    }

    #[test]
    fn bad_key_fails() {
        let err = run_args(&["decompose", "--key", "not-a-key"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::InvalidEncoding { byte: b'-', index: 3 })
        ));
    }

    #[test]
    fn provider_failure_surfaces() {
        let err = run_args(&["--machine-id", "env:KUBEFLAKE_TEST_UNSET_MACHINE", "next"])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kubeflake::Error>(),
            Some(kubeflake::Error::ProviderFailure(_))
        ));
    }
}
