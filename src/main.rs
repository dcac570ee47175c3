use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use txclock::bucket::Bucketizer;
use txclock::calendar::TimeUnit;
use txclock::report::{Report, ReportContext, UnitReport};
use txclock::rpc::JsonRpcBlockSource;
use txclock::source::{BlockSource, ProgressCallback};
use txclock::types::BlockRange;
use txclock::{aggregate, chart, config, debug_log, display, report, source, utils};

#[derive(Parser)]
#[command(name = "txclock")]
#[command(version)]
#[command(disable_help_subcommand = true)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct ScanArgs {
    /// First block to scan (inclusive)
    #[arg(long, env = "TXCLOCK_START_BLOCK", required = true)]
    start_block: Option<u64>,

    /// Last block to scan (inclusive)
    #[arg(long, env = "TXCLOCK_END_BLOCK", required = true)]
    end_block: Option<u64>,

    /// HTTP(S) JSON-RPC endpoint of the node. ws:// and wss:// endpoints are
    /// not supported, use the node's https:// address instead
    #[arg(long, env = "TXCLOCK_NODE_URL")]
    node_url: Option<String>,

    /// IANA timezone used to bucket timestamps (defaults to the host's timezone)
    #[arg(long, env = "TXCLOCK_TIMEZONE")]
    timezone: Option<String>,

    /// Output the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Show a bar chart of one time unit (year, month, day, hour, minute)
    #[arg(long, value_name = "UNIT")]
    chart: Option<String>,

    /// Zero-pad minutes in minute buckets (9:05 instead of 9:5)
    #[arg(long)]
    pad_minutes: bool,

    /// Maximum number of block requests in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Use comma-separated number formatting
    #[arg(long)]
    number_comma: bool,

    /// Use human-readable number formatting (k, m, b, t)
    #[arg(short = 'H', long)]
    number_human: bool,

    /// Locale for number formatting (en, de, fr, es, it, ja, ko, zh)
    #[arg(long)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubcommands,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Create default configuration file
    Init {
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (node-url, timeout-seconds, concurrency, timezone, pad-minutes, number-comma, number-human, locale, decimal-places)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Settings for one scan after merging the config file with CLI overrides.
struct ScanSettings {
    range: BlockRange,
    node_url: String,
    timeout: Duration,
    concurrency: usize,
    timezone: Option<String>,
    pad_minutes: bool,
    chart: Option<TimeUnit>,
    json: bool,
    format_options: utils::NumberFormatOptions,
}

impl ScanSettings {
    fn resolve(args: ScanArgs, config: config::Config) -> Result<Self> {
        let start = args.start_block.context("--start-block is required")?;
        let end = args.end_block.context("--end-block is required")?;
        let range = BlockRange::new(start, end)?;

        let chart = args
            .chart
            .as_deref()
            .map(str::parse::<TimeUnit>)
            .transpose()
            .context("Invalid --chart value")?;

        let timezone = args
            .timezone
            .or_else(|| config.timezone().map(str::to_string));

        Ok(Self {
            range,
            node_url: args.node_url.unwrap_or(config.node.url),
            timeout: Duration::from_secs(config.node.timeout_seconds),
            concurrency: args.concurrency.unwrap_or(config.node.concurrency).max(1),
            timezone,
            pad_minutes: args.pad_minutes || config.report.pad_minutes,
            chart,
            json: args.json,
            format_options: utils::NumberFormatOptions {
                use_comma: args.number_comma || config.formatting.number_comma,
                use_human: args.number_human || config.formatting.number_human,
                locale: args.locale.unwrap_or(config.formatting.locale),
                decimal_places: config.formatting.decimal_places,
            },
        })
    }
}

#[tokio::main]
async fn main() {
    debug_log::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config(config_args)) => {
            handle_config_subcommand(config_args);
        }
        None => {
            if let Err(e) = run_scan(cli.scan).await {
                display::show_error(&format!("{e:#}"));
                std::process::exit(1);
            }
        }
    }
}

async fn run_scan(args: ScanArgs) -> Result<()> {
    let config = config::Config::load()
        .context("Failed to load configuration")?
        .unwrap_or_default();
    let settings = ScanSettings::resolve(args, config)?;

    // Resolve the timezone before touching the network so a typo fails fast.
    let bucketizer = Bucketizer::from_name(settings.timezone.as_deref())?;

    display::show_connecting(&settings.node_url);
    let node = JsonRpcBlockSource::new(&settings.node_url, settings.timeout)?;

    let progress = (!settings.json)
        .then(|| display::create_fetch_progress_callback(&settings.format_options));
    let report = scan(&node, &settings, &bucketizer, progress).await?;

    print!("{}", render_output(&report, &settings)?);

    if let Some(unit_report) = chart_unit(&report, &settings) {
        chart::show_chart(unit_report).context("Failed to display chart")?;
    }

    Ok(())
}

/// Verify the range against the node, fetch every block and build the report.
async fn scan(
    node: &dyn BlockSource,
    settings: &ScanSettings,
    bucketizer: &Bucketizer,
    progress: Option<ProgressCallback>,
) -> Result<Report> {
    let head = source::verify_range(node, settings.range).await?;
    display::show_connected(node.endpoint(), head);

    let transactions =
        source::collect_transactions(node, settings.range, settings.concurrency, progress)
            .await
            .context("Failed to retrieve blocks")?;

    let timestamps = source::timestamps(&transactions)?;
    let histograms = aggregate::aggregate(timestamps, bucketizer)?;

    let context = ReportContext {
        start_block: settings.range.start,
        end_block: settings.range.end,
        timezone: bucketizer.timezone().name().to_string(),
        pad_minutes: settings.pad_minutes,
    };
    Ok(report::build_report(histograms, &context)?)
}

fn render_output(report: &Report, settings: &ScanSettings) -> Result<String> {
    if settings.json {
        let mut json = simd_json::to_string_pretty(report)?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(display::render_report(report, &settings.format_options))
    }
}

/// The unit to chart, if one was requested and there is anything to draw.
fn chart_unit<'a>(report: &'a Report, settings: &ScanSettings) -> Option<&'a UnitReport> {
    let unit = settings.chart?;
    if report.is_empty() {
        utils::warn_once("No transactions found in range, skipping chart");
        return None;
    }
    report.unit(unit)
}

fn handle_config_subcommand(config_args: ConfigArgs) {
    let result = match config_args.subcommand {
        ConfigSubcommands::Init { overwrite } => config::create_default_config(overwrite)
            .context("Error creating config"),
        ConfigSubcommands::Show => config::show_config().context("Error showing config"),
        ConfigSubcommands::Set { key, value } => {
            config::set_config_value(&key, &value).context("Error setting config")
        }
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use txclock::error::Error;
    use txclock::types::{Block, BlockTransaction};

    // 2023-01-02 09:00:00 UTC, a Monday.
    const MONDAY_0900_UTC: u64 = 1_672_650_000;
    // 2023-01-03 10:00:00 UTC, a Tuesday.
    const TUESDAY_1000_UTC: u64 = 1_672_740_000;

    struct FakeNode {
        blocks: BTreeMap<u64, Block>,
        reachable: bool,
        fetches: AtomicUsize,
    }

    impl FakeNode {
        fn new(blocks: Vec<(u64, u64, usize)>) -> Self {
            Self {
                blocks: blocks
                    .into_iter()
                    .map(|(number, timestamp, txs)| {
                        let transactions = (0..txs)
                            .map(|i| BlockTransaction {
                                from: Some(format!("0xfrom{i}")),
                                to: Some(format!("0xto{i}")),
                            })
                            .collect();
                        (
                            number,
                            Block {
                                number,
                                timestamp,
                                transactions,
                            },
                        )
                    })
                    .collect(),
                reachable: true,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BlockSource for FakeNode {
        fn endpoint(&self) -> &str {
            "memory://fake"
        }

        async fn check_connection(&self) -> txclock::error::Result<u64> {
            if !self.reachable {
                return Err(Error::connection(self.endpoint(), "connection refused"));
            }
            Ok(self.blocks.keys().next_back().copied().unwrap_or(0))
        }

        async fn get_block(&self, number: u64) -> txclock::error::Result<Block> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.blocks
                .get(&number)
                .cloned()
                .ok_or(Error::MissingBlock(number))
        }
    }

    fn utc_settings(extra: &[&str]) -> ScanSettings {
        let mut args = vec!["--timezone", "UTC"];
        args.extend_from_slice(extra);
        ScanSettings::resolve(parse(&args).scan, config::Config::default()).unwrap()
    }

    async fn run(node: &FakeNode, settings: &ScanSettings) -> Result<Report> {
        let bucketizer = Bucketizer::from_name(settings.timezone.as_deref()).unwrap();
        scan(node, settings, &bucketizer, None).await
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("txclock").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn scan_flags_override_config() {
        let cli = parse(&[
            "--start-block",
            "10",
            "--end-block",
            "20",
            "--node-url",
            "http://localhost:8545",
            "--timezone",
            "Asia/Tokyo",
            "--chart",
            "day",
            "--concurrency",
            "0",
            "--pad-minutes",
            "-H",
        ]);
        assert!(cli.command.is_none());

        let settings = ScanSettings::resolve(cli.scan, config::Config::default()).unwrap();
        assert_eq!(settings.range, BlockRange::new(10, 20).unwrap());
        assert_eq!(settings.node_url, "http://localhost:8545");
        assert_eq!(settings.timezone.as_deref(), Some("Asia/Tokyo"));
        assert_eq!(settings.chart, Some(TimeUnit::Weekday));
        assert_eq!(settings.concurrency, 1);
        assert!(settings.pad_minutes);
        assert!(settings.format_options.use_human);
        assert!(!settings.json);
    }

    #[test]
    fn config_supplies_defaults() {
        let cli = parse(&["--start-block", "1", "--end-block", "1"]);
        let mut config = config::Config::default();
        config.report.timezone = "Europe/Berlin".to_string();
        config.node.concurrency = 3;

        let settings = ScanSettings::resolve(cli.scan, config).unwrap();
        assert_eq!(settings.node_url, "https://core.bloxberg.org");
        assert_eq!(settings.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.chart, None);
    }

    #[test]
    fn reversed_range_is_rejected_before_network() {
        let cli = parse(&["--start-block", "20", "--end-block", "10"]);
        let err = ScanSettings::resolve(cli.scan, config::Config::default())
            .err()
            .expect("range should be rejected");
        assert!(format!("{err:#}").contains("start block 20 is greater than end block 10"));
    }

    #[test]
    fn unknown_chart_unit_is_rejected() {
        let cli = parse(&["--start-block", "1", "--end-block", "2", "--chart", "fortnight"]);
        let err = ScanSettings::resolve(cli.scan, config::Config::default())
            .err()
            .expect("chart unit should be rejected");
        assert!(format!("{err:#}").contains("Invalid value of time unit fortnight!"));
    }

    #[test]
    fn node_url_help_mentions_websocket_endpoints() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("wss://"));
        assert!(help.contains("https://"));
    }

    #[test]
    fn config_subcommand_does_not_need_a_range() {
        let cli = parse(&["config", "show"]);
        assert!(matches!(cli.command, Some(Commands::Config(_))));
    }

    #[tokio::test]
    async fn scan_builds_tables_from_node_blocks() {
        // Monday 09:00 twice, Tuesday 10:00 once, and an empty block.
        let node = FakeNode::new(vec![
            (10, MONDAY_0900_UTC, 2),
            (11, TUESDAY_1000_UTC, 1),
            (12, TUESDAY_1000_UTC + 60, 0),
        ]);
        let settings = utc_settings(&["--start-block", "10", "--end-block", "12"]);

        let report = run(&node, &settings).await.unwrap();
        assert_eq!(report.transactions, 3);
        assert_eq!(report.timezone, "UTC");

        let weekdays = report.unit(TimeUnit::Weekday).unwrap();
        assert_eq!(
            weekdays.rows,
            vec![("Mon".to_string(), 2), ("Tue".to_string(), 1)]
        );
        let hours = report.unit(TimeUnit::Hour).unwrap();
        assert_eq!(hours.rows, vec![("9".to_string(), 2), ("10".to_string(), 1)]);

        let text = render_output(&report, &settings).unwrap();
        assert!(text.starts_with(
            "Printing statistic of 3 transactions (block numbers 10-12, timezone UTC):"
        ));
        assert!(text.contains("Year with most transactions is 2023\n"));
        assert!(text.contains("Month with most transactions is Jan\n"));
        assert!(text.contains("Day with most transactions is Mon\n"));
        assert!(text.contains("Hour with most transactions is 9\n"));
        assert!(text.contains("Minute with most transactions is 9:0\n"));
        assert_eq!(node.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn json_output_carries_the_report() {
        let node = FakeNode::new(vec![(10, MONDAY_0900_UTC, 1)]);
        let settings = utc_settings(&["--start-block", "10", "--end-block", "10", "--json"]);

        let report = run(&node, &settings).await.unwrap();
        let json = render_output(&report, &settings).unwrap();

        assert!(json.trim_start().starts_with('{'));
        assert!(json.contains("\"Mon\""));
        assert!(!json.contains("Printing statistic"));
    }

    #[tokio::test]
    async fn scan_of_empty_blocks_reports_no_transactions() {
        let node = FakeNode::new(vec![(20, MONDAY_0900_UTC, 0), (21, TUESDAY_1000_UTC, 0)]);
        let settings =
            utc_settings(&["--start-block", "20", "--end-block", "21", "--chart", "hour"]);

        let report = run(&node, &settings).await.unwrap();
        assert!(report.is_empty());
        assert!(report.units.iter().all(|u| u.rows.is_empty() && u.peak.is_none()));

        let text = render_output(&report, &settings).unwrap();
        assert!(text.contains("No transactions found in range"));
        assert!(!text.contains("with most transactions"));
        assert!(chart_unit(&report, &settings).is_none());
    }

    #[tokio::test]
    async fn chart_unit_is_picked_from_a_populated_report() {
        let node = FakeNode::new(vec![(10, MONDAY_0900_UTC, 1)]);
        let settings =
            utc_settings(&["--start-block", "10", "--end-block", "10", "--chart", "day"]);

        let report = run(&node, &settings).await.unwrap();
        let unit = chart_unit(&report, &settings).unwrap();
        assert_eq!(unit.unit, TimeUnit::Weekday);
        assert_eq!(unit.peak.as_deref(), Some("Mon"));
    }

    #[tokio::test]
    async fn unreachable_node_fails_before_fetching() {
        let mut node = FakeNode::new(vec![(10, MONDAY_0900_UTC, 1)]);
        node.reachable = false;
        let settings = utc_settings(&["--start-block", "10", "--end-block", "10"]);

        let err = run(&node, &settings).await.err().expect("scan should fail");
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Connection { .. })
        ));
        assert_eq!(node.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn range_past_head_is_rejected_before_fetching() {
        let node = FakeNode::new(vec![(10, MONDAY_0900_UTC, 1)]);
        let settings = utc_settings(&["--start-block", "10", "--end-block", "11"]);

        let err = run(&node, &settings).await.err().expect("scan should fail");
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::BlockNotYetProduced { end: 11, head: 10 })
        ));
        assert_eq!(node.fetches.load(Ordering::SeqCst), 0);
    }
}
