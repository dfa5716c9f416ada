use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Default filter directives for a verbosity level. `RUST_LOG` overrides them.
///
/// The `afk` directive covers every crate and log target of this workspace
/// (`afk`, `afk_cli`, `afk.session`, `afk.driver`, ...).
pub fn default_directives(verbosity: u8, quiet: bool) -> &'static str {
	if quiet {
		return "error";
	}
	match verbosity {
		0 => "warn,afk=info",
		1 => "warn,afk=debug",
		_ => "info,afk=trace",
	}
}

pub fn init_logging(verbosity: u8, quiet: bool) {
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity, quiet)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(verbosity > 0)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_levels() {
		assert_eq!(default_directives(0, false), "warn,afk=info");
		assert_eq!(default_directives(1, false), "warn,afk=debug");
		assert_eq!(default_directives(5, false), "info,afk=trace");
		assert_eq!(default_directives(2, true), "error");
	}

	#[test]
	fn directives_parse() {
		for verbosity in 0..3 {
			EnvFilter::try_new(default_directives(verbosity, false)).unwrap();
		}
	}
}
