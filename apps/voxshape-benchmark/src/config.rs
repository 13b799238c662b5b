//! Command line configuration.

/// Workload parameters (from CLI or defaults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Seed for shape and query generation.
    pub seed: u64,
    /// Number of shapes placed in the world.
    pub shapes: usize,
    /// Number of collision and ray queries.
    pub queries: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            shapes: 512,
            queries: 10_000,
        }
    }
}

impl BenchConfig {
    /// Parse parameters from command line arguments.
    pub fn from_args() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse parameters from an argument list without the program name.
    ///
    /// Unknown flags and unparsable values are ignored.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut config = Self::default();
        let args: Vec<String> = args.into_iter().collect();

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "--seed" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.seed = v;
                        i += 1;
                    }
                }
                "--shapes" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.shapes = v;
                        i += 1;
                    }
                }
                "--queries" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.queries = v;
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        config
    }
}
