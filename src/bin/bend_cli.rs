#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("bend_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::{Path, PathBuf};

    use log::LevelFilter;
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use vector_bender::bender::{Bender, Feature, RunOptions, determine_kind};
    use vector_bender::pairs::PairLine;
    use vector_bender::transform::Capabilities;

    const USAGE: &str = r#"bend_cli (vector-bender)

USAGE:
  bend_cli capabilities
  bend_cli kind    --pairs <file> [options]
  bend_cli preview --pairs <file> [options]
  bend_cli run     --pairs <file> --input <file> [options]

FILES:
  pairs    JSON array of pair lines: {"vertices": [[x, y], ...], "selected": bool}
  input    JSON array of features:   {"geometry": {...}, "selected": bool, "id": any, ...}
           members other than geometry are written back unchanged
  options  JSON run options; flags given on the command line win

OPTIONS:
  --options <file>       Read run options from a JSON file
  --buffer <distance>    Grow the bend mesh past the hull of the pair sources
  --restrict-pairs       Only read selected pair lines
  --restrict-features    Only bend selected features (run)
  --out <file>           Write JSON output here instead of stdout
  --pins <file>          Write the pair lines collapsed to pins (run)
  --overwrite            Overwrite existing output files
  -v, --verbose          Log progress to stderr (-vv for debug detail)
  --log-level <level>    Stderr log level: off, error, warn, info, debug, trace
  -h, --help             Show this help
"#;

    #[derive(Debug, Default)]
    struct CommonArgs {
        pairs: Option<PathBuf>,
        input: Option<PathBuf>,
        out: Option<PathBuf>,
        pins: Option<PathBuf>,
        options: RunOptions,
        overwrite: bool,
    }

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "capabilities" => print_json(&Capabilities::probe()),
            "kind" => cmd_kind(&mut args),
            "preview" => cmd_preview(&mut args),
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_kind(args: &mut Args) -> Result<(), String> {
        let Some(common) = parse_common(args)? else {
            return Ok(());
        };
        let pair_lines = read_pairs(&common)?;
        let kind = determine_kind(&pair_lines, &common.options, &Capabilities::probe())
            .map_err(|e| e.to_string())?;
        println!("{kind}");
        Ok(())
    }

    fn cmd_preview(args: &mut Args) -> Result<(), String> {
        let Some(common) = parse_common(args)? else {
            return Ok(());
        };
        let pair_lines = read_pairs(&common)?;
        let bender = build_bender(&pair_lines, &common)?;
        write_output(common.out.as_deref(), &bender.preview(), common.overwrite)
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let Some(common) = parse_common(args)? else {
            return Ok(());
        };
        let input = common.input.as_deref().ok_or("missing --input <file>")?;
        let pair_lines = read_pairs(&common)?;
        let features: Vec<Feature> = read_json(input)?;
        let bender = build_bender(&pair_lines, &common)?;

        let mut report = |done: usize, total: usize| {
            if done == total || done % 1000 == 0 {
                log::info!("{done}/{total} features");
            }
        };
        let bent = bender.bend_features(&features, Some(&mut report));
        write_output(common.out.as_deref(), &bent, common.overwrite)?;

        if let Some(path) = common.pins.as_deref() {
            write_output(Some(path), &bender.pins(&pair_lines), common.overwrite)?;
        } else if common.options.pairs_to_pins {
            return Err("pairs_to_pins is set; give --pins <file> for the result".to_string());
        }
        Ok(())
    }

    /// Returns `None` when help was printed.
    fn parse_common(args: &mut Args) -> Result<Option<CommonArgs>, String> {
        let mut common = CommonArgs::default();
        let mut options_file: Option<PathBuf> = None;
        let mut buffer: Option<f64> = None;
        let mut restrict_pairs = false;
        let mut restrict_features = false;
        let mut verbosity = 0u8;
        let mut log_level: Option<LevelFilter> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--pairs" => common.pairs = Some(PathBuf::from(args.value("--pairs")?)),
                "--input" => common.input = Some(PathBuf::from(args.value("--input")?)),
                "--out" => common.out = Some(PathBuf::from(args.value("--out")?)),
                "--pins" => common.pins = Some(PathBuf::from(args.value("--pins")?)),
                "--options" => options_file = Some(PathBuf::from(args.value("--options")?)),
                "--buffer" => {
                    let raw = args.value("--buffer")?;
                    let value = raw
                        .parse::<f64>()
                        .map_err(|e| format!("invalid --buffer `{raw}`: {e}"))?;
                    buffer = Some(value);
                }
                "--restrict-pairs" => restrict_pairs = true,
                "--restrict-features" => restrict_features = true,
                "--overwrite" => common.overwrite = true,
                "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
                "-vv" => verbosity = verbosity.saturating_add(2),
                "--log-level" => {
                    let raw = args.value("--log-level")?;
                    let level = raw
                        .parse::<LevelFilter>()
                        .map_err(|e| format!("invalid --log-level `{raw}`: {e}"))?;
                    log_level = Some(level);
                }
                "-h" | "--help" => {
                    print_usage();
                    return Ok(None);
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let level = log_level.unwrap_or_else(|| stderr_logger::level_for(verbosity));
        if level != LevelFilter::Off {
            stderr_logger::install(level);
        }

        let mut options = match options_file.as_deref() {
            Some(path) => read_json::<RunOptions>(path)?,
            None => RunOptions::default(),
        };
        if let Some(buffer) = buffer {
            options = options.buffer(buffer);
        }
        if restrict_pairs {
            options = options.restrict_pairs_to_selection(true);
        }
        if restrict_features {
            options = options.restrict_features_to_selection(true);
        }
        if common.pins.is_some() {
            options = options.pairs_to_pins(true);
        }
        common.options = options;
        Ok(Some(common))
    }

    fn read_pairs(common: &CommonArgs) -> Result<Vec<PairLine>, String> {
        let path = common.pairs.as_deref().ok_or("missing --pairs <file>")?;
        read_json(path)
    }

    fn build_bender(pair_lines: &[PairLine], common: &CommonArgs) -> Result<Bender, String> {
        let bender = Bender::new(pair_lines, common.options, &Capabilities::probe())
            .map_err(|e| e.to_string())?;
        log::info!("{} transform from {} pairs", bender.kind(), bender.pairs().len());
        Ok(bender)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
        let text =
            fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))
    }

    fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
        write_output(None, value, false)
    }

    fn write_output<T: Serialize>(path: Option<&Path>, value: &T, overwrite: bool) -> Result<(), String> {
        let text = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
        let Some(path) = path else {
            println!("{text}");
            return Ok(());
        };
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    mod stderr_logger {
        use std::sync::OnceLock;

        use log::{LevelFilter, Log, Metadata, Record};

        pub(super) struct StderrLogger {
            pub(super) level: LevelFilter,
        }

        static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

        impl Log for StderrLogger {
            fn enabled(&self, metadata: &Metadata<'_>) -> bool {
                metadata.level() <= self.level
            }

            fn log(&self, record: &Record<'_>) {
                if self.enabled(record.metadata()) {
                    eprintln!("[{}] {}", record.level(), record.args());
                }
            }

            fn flush(&self) {}
        }

        /// `-v` shows progress, `-vv` and more add debug detail.
        pub fn level_for(verbosity: u8) -> LevelFilter {
            match verbosity {
                0 => LevelFilter::Off,
                1 => LevelFilter::Info,
                _ => LevelFilter::Debug,
            }
        }

        pub fn install(level: LevelFilter) {
            let logger = LOGGER.get_or_init(|| StderrLogger { level });
            if log::set_logger(logger).is_ok() {
                log::set_max_level(logger.level);
            }
        }
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }

}
