// Entry point and high-level CLI flow.
//
// - `options` prints a cascading selector list.
// - `report` prints the condition summary and writes report tables, a JSON
//   summary and a GeoJSON map layer.
// - `export` writes the filtered rows back out as CSV.
// - `interactive` keeps one loaded dataset and lets the user refine filters
//   and regenerate reports from a menu.
mod cli;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputArgs, SourceArgs, SourceKind};
use jalan_desa::cache::FilterCache;
use jalan_desa::geo::map_view;
use jalan_desa::loader::{self, LoadReport};
use jalan_desa::reports::{self, UnitPrices};
use jalan_desa::util::{format_int, format_number};
use jalan_desa::{
    apply_filter, cascade_options, compute_stats, output, resolve_options, Dataset, Dimension,
    Selection, SelectionCriteria,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Options { level, filters } => {
            let (data, _) = load(&cli.source, None)?;
            let criteria = filters.criteria();
            let dim = level.dimension();
            let fixed = match dim {
                Dimension::SubRegion => Some((Dimension::ProvinceRegion, &criteria.province_region)),
                Dimension::Village => Some((Dimension::SubRegion, &criteria.sub_region)),
                _ => None,
            };
            for value in resolve_options(&data, dim, fixed)? {
                println!("{value}");
            }
        }
        Commands::Report {
            filters,
            prices,
            output,
        } => {
            let criteria = filters.criteria();
            let (data, report) = load(&cli.source, Some(&criteria))?;
            print_load_report(&report);
            let filtered = apply_filter(&data, &criteria)?;
            generate_reports(&filtered, &criteria, &prices.unit_prices(), &output)?;
        }
        Commands::Export {
            filters,
            output: path,
        } => {
            let criteria = filters.criteria();
            let (data, _) = load(&cli.source, Some(&criteria))?;
            let filtered = apply_filter(&data, &criteria)?;
            output::write_segments(&path, filtered.rows())
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Exported {} rows to {}",
                format_int(filtered.len()),
                path.display()
            );
        }
        Commands::Interactive { prices, output } => {
            interactive(&cli.source, &prices.unit_prices(), &output)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Load the configured source. SQLite sources evaluate `criteria` in the query;
/// the others load every row.
fn load(source: &SourceArgs, criteria: Option<&SelectionCriteria>) -> Result<(Dataset, LoadReport)> {
    let loaded = match source.source {
        SourceKind::Csv => loader::load_csv(&source.data),
        #[cfg(feature = "parquet")]
        SourceKind::Parquet => jalan_desa::parquet::load_parquet(&source.data),
        #[cfg(not(feature = "parquet"))]
        SourceKind::Parquet => anyhow::bail!("this build does not include Parquet support"),
        #[cfg(feature = "sqlite")]
        SourceKind::Sqlite => {
            let all = SelectionCriteria::all();
            jalan_desa::sqlite::load_sqlite_filtered(
                &source.data,
                &source.table,
                criteria.unwrap_or(&all),
            )
        }
        #[cfg(not(feature = "sqlite"))]
        SourceKind::Sqlite => {
            let _ = criteria;
            anyhow::bail!("this build does not include SQLite support")
        }
    };
    loaded.with_context(|| format!("loading {}", source.data.display()))
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        format_int(report.total_rows),
        format_int(report.loaded_rows)
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(report.parse_errors)
        );
    }
    let q = &report.quality;
    if q.length_mismatches > 0 {
        println!(
            "Warning: {} rows have a total length that differs from the condition sum.",
            format_int(q.length_mismatches)
        );
    }
    if q.missing_lengths > 0 {
        println!(
            "Info: {} rows have missing lengths (counted as 0).",
            format_int(q.missing_lengths)
        );
    }
    if let Some(notice) = report.empty_notice() {
        println!("Warning: {notice}.");
    }
    println!();
}

/// Print the condition summary and write every report file for `filtered`.
fn generate_reports(
    filtered: &Dataset,
    criteria: &SelectionCriteria,
    prices: &UnitPrices,
    out: &OutputArgs,
) -> Result<()> {
    std::fs::create_dir_all(&out.out_dir)
        .with_context(|| format!("creating {}", out.out_dir.display()))?;
    let dir = out.out_dir.as_path();
    let stats = compute_stats(filtered.rows());

    println!("Road Condition Summary ({})\n", criteria);
    println!("Total segments:  {}", format_int(stats.total_segments));
    println!("Total length:    {} m", format_number(stats.total_length(), 0));
    for (label, len) in [
        ("Good", stats.good),
        ("Light damage", stats.light),
        ("Moderate damage", stats.moderate),
        ("Heavy damage", stats.heavy),
    ] {
        println!(
            "{:<16} {} m ({}%)",
            format!("{label}:"),
            format_number(len, 0),
            format_number(stats.pct(len), 1)
        );
    }
    println!(
        "Damaged overall: {} m ({}%)\n",
        format_number(stats.total_damaged(), 0),
        format_number(stats.pct(stats.total_damaged()), 1)
    );

    let summary = reports::generate_summary(filtered, criteria);
    if let Some(h) = &summary.longest_heavy_damage {
        println!("Longest heavy-damage segment:");
        println!("- Location: {}", h.location);
        println!("- Segment: {}", h.segment_name);
        println!("- Heavy damage: {} m\n", format_number(h.heavy_damage, 0));
    }

    let grouping = criteria.grouping_dimension();
    let r1 = reports::generate_group_report(filtered, criteria);
    write_report(dir, "report1_condition_by_group.csv", &r1)?;
    output::preview_table(
        &format!("Report 1: Road Condition per {grouping}"),
        Some("Lengths in meters"),
        &r1,
        out.preview_rows,
    );

    let r2 = reports::generate_surface_report(filtered);
    write_report(dir, "report2_condition_by_surface.csv", &r2)?;
    output::preview_table(
        "Report 2: Road Condition by Surface Type",
        None,
        &r2,
        out.preview_rows,
    );

    let r3 = reports::generate_village_report(filtered);
    write_report(dir, "report3_village_summary.csv", &r3)?;
    output::preview_table(
        "Report 3: Village Summary",
        Some("Grouped by KABUPATEN, KECAMATAN and DESA"),
        &r3,
        out.preview_rows,
    );

    let r4 = reports::generate_cost_report(&stats, prices);
    write_report(dir, "report4_repair_cost.csv", &r4)?;
    output::preview_table(
        "Report 4: Repair Cost Estimate",
        Some("Rupiah, length x unit price"),
        &r4,
        r4.len(),
    );

    output::write_json(dir.join("summary.json"), &summary).context("writing summary.json")?;

    match map_view(filtered) {
        Some(view) => {
            output::write_json(dir.join("map.geojson"), &view.to_geojson())
                .context("writing map.geojson")?;
            println!(
                "Map: {} segments centred at ({:.5}, {:.5})",
                format_int(view.segments.len()),
                view.center.0,
                view.center.1
            );
        }
        None => println!("Map: no coordinates to display."),
    }
    println!("(Outputs saved to {})\n", dir.display());
    info!(rows = filtered.len(), dir = %dir.display(), "reports generated");
    Ok(())
}

fn write_report<T: serde::Serialize + tabled::Tabled>(
    dir: &Path,
    name: &str,
    rows: &[T],
) -> Result<()> {
    output::write_table(dir.join(name), rows).with_context(|| format!("writing {name}"))
}

/// State of one interactive session. The dataset is never mutated; every filter
/// change produces a new snapshot through the cache.
struct Session {
    data: Option<Dataset>,
    criteria: SelectionCriteria,
    cache: FilterCache,
}

/// Next trimmed line of input, or `None` once stdin is closed or unreadable.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    read_line_from(&mut io::stdin().lock())
}

fn read_line_from(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Present `options` as a numbered list and return the chosen one.
/// An empty answer keeps `current`; `None` means input ended.
fn choose(label: &str, options: &[String], current: &Selection) -> Option<Selection> {
    loop {
        println!("{label} (current: {current})");
        for (i, opt) in options.iter().enumerate() {
            println!("  [{}] {}", i, opt);
        }
        let input = read_choice()?;
        if input.is_empty() {
            return Some(current.clone());
        }
        match input.parse::<usize>().ok().and_then(|i| options.get(i)) {
            Some(opt) => return Some(Selection::parse(opt)),
            None => println!("Invalid choice. Enter a number from the list.\n"),
        }
    }
}

fn handle_load(session: &mut Session, source: &SourceArgs) {
    match load(source, None) {
        Ok((data, report)) => {
            print_load_report(&report);
            session.data = Some(data);
            session.criteria = SelectionCriteria::all();
        }
        Err(e) => eprintln!("Failed to load data: {e:#}\n"),
    }
}

fn handle_filters(session: &mut Session) -> Result<()> {
    let Some(data) = &session.data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return Ok(());
    };
    let mut c = session.criteria.clone();

    // Input ending midway leaves the previous selection in place.
    let opts = cascade_options(data, &c)?;
    let Some(sel) = choose("District (KABUPATEN)", &opts.province_regions, &c.province_region)
    else {
        return Ok(());
    };
    c.province_region = sel;

    let opts = cascade_options(data, &c)?;
    if !opts.sub_regions.contains(&c.sub_region.to_string()) {
        c.sub_region = Selection::All;
    }
    let Some(sel) = choose("Sub-district (KECAMATAN)", &opts.sub_regions, &c.sub_region) else {
        return Ok(());
    };
    c.sub_region = sel;

    let opts = cascade_options(data, &c)?;
    if !opts.villages.contains(&c.village.to_string()) {
        c.village = Selection::All;
    }
    let Some(sel) = choose("Village (DESA)", &opts.villages, &c.village) else {
        return Ok(());
    };
    c.village = sel;
    let Some(sel) = choose(
        "Surface type (JENIS PERKERASAN)",
        &opts.surface_types,
        &c.surface_type,
    ) else {
        return Ok(());
    };
    c.surface_type = sel;

    let snap = session.cache.get_or_compute(data, &c)?;
    println!(
        "\nSelected {}: {} segments, {} m total.\n",
        c,
        format_int(snap.stats.total_segments),
        format_number(snap.stats.total_length(), 0)
    );
    session.criteria = c;
    Ok(())
}

fn handle_generate(session: &mut Session, prices: &UnitPrices, out: &OutputArgs) -> Result<()> {
    let Some(data) = &session.data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return Ok(());
    };
    let snap = session.cache.get_or_compute(data, &session.criteria)?;
    generate_reports(&snap.rows, &session.criteria, prices, out)
}

fn interactive(source: &SourceArgs, prices: &UnitPrices, out: &OutputArgs) -> Result<()> {
    let mut session = Session {
        data: None,
        criteria: SelectionCriteria::all(),
        cache: FilterCache::new(),
    };
    loop {
        println!("Village Road Condition Dashboard");
        println!("[1] Load the data");
        println!("[2] Choose filters");
        println!("[3] Generate reports");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            println!("\nInput closed; exiting.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session, source),
            "2" => {
                println!();
                handle_filters(&mut session)?;
            }
            "3" => {
                println!();
                if let Err(e) = handle_generate(&mut session, prices, out) {
                    eprintln!("Report error: {e:#}\n");
                }
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-3.\n"),
        }
    }
    let (hits, misses) = session.cache.counters();
    info!(hits, misses, "session finished");
    Ok(())
}
