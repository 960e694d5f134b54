// Entry point and interactive menu.
//
// Records are fetched once at startup. After that the menu drives the same
// events a browser page would: pick a district, change the chart type, detect
// the district from coordinates, export what is on screen.
use chrono::Local;
use mgnrega_report::config::{Config, HELP};
use mgnrega_report::detect::{detect, FixedLocator, Nominatim};
use mgnrega_report::render::{export_csv, write_json, ChartRenderer, JsonChartWriter, TableRenderer};
use mgnrega_report::source::{fetch_records, load_records_from_file, FetchOutcome, ReqwestHttp};
use mgnrega_report::summary::insights_text;
use mgnrega_report::types::ChartType;
use mgnrega_report::util::format_int;
use mgnrega_report::{AppError, DetectStatus, DetectionReport, Session, ViewUpdate};
use std::io::{self, BufRead, Write};
use tracing::error;
use tracing_subscriber::EnvFilter;

type AppSession = Session<Box<dyn ChartRenderer>>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// One trimmed line, or `None` once input is closed or unreadable.
fn read_trimmed<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_trimmed(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

fn make_renderer(config: &Config) -> Box<dyn ChartRenderer> {
    match &config.chart_json {
        Some(path) => Box::new(JsonChartWriter::new(path.clone())),
        None => Box::new(TableRenderer::new(io::stdout())),
    }
}

/// Fetch (or load) the records and start a fresh session.
///
/// Empty responses and failures are reported and leave `None` behind; the
/// menu stays usable either way.
fn handle_load(config: &Config) -> Option<AppSession> {
    let loaded = match &config.file {
        Some(path) => load_records_from_file(path),
        None => fetch_records(&ReqwestHttp, &config.api_url),
    };
    match loaded {
        Ok((FetchOutcome::Empty, _)) => {
            println!("No data found from API.\n");
            None
        }
        Ok((FetchOutcome::Loaded(records), report)) => {
            let session = Session::new(records, make_renderer(config));
            println!(
                "Loaded {} records covering {} districts ({}).",
                format_int(report.total_records),
                format_int(session.districts().len()),
                report.fetched_at.format("%Y-%m-%d %H:%M:%S")
            );
            if report.skipped_entries > 0 {
                println!(
                    "Note: {} entries skipped because they were not records.",
                    format_int(report.skipped_entries)
                );
            }
            println!();
            Some(session)
        }
        Err(e) => {
            error!("fetching data failed: {}", e);
            println!("Error fetching MGNREGA data. Please try again later.\n");
            None
        }
    }
}

fn print_view(view: &ViewUpdate) {
    match view {
        ViewUpdate::Hidden => println!("Select a district to see its chart.\n"),
        ViewUpdate::NoData { district } => {
            println!("No valid data available for {}. Try another district.\n", district)
        }
        ViewUpdate::Rendered { district, summary, .. } => {
            println!("{}\n", summary);
            println!("{}\n", insights_text(district));
        }
    }
}

fn report_render_error(e: AppError) {
    error!("rendering failed: {}", e);
    println!("Could not draw the chart: {}\n", e);
}

fn handle_select(session: &mut AppSession) {
    if session.districts().is_empty() {
        println!("No districts found in the data.\n");
        return;
    }
    println!("[0] -- Select District --");
    for (i, d) in session.districts().iter().enumerate() {
        println!("[{}] {}", i + 1, d);
    }
    let Some(input) = prompt("District (number or name): ") else {
        return;
    };
    let district = match input.parse::<usize>() {
        Ok(0) => String::new(),
        Ok(n) => match session.districts().get(n - 1) {
            Some(d) => d.to_string(),
            None => {
                println!("Invalid choice.\n");
                return;
            }
        },
        Err(_) => input,
    };
    match session.select_district(&district) {
        Ok(view) => print_view(&view),
        Err(e) => report_render_error(e),
    }
}

fn handle_chart_type(session: &mut AppSession) {
    let names: Vec<&str> = ChartType::ALL.iter().map(|t| t.as_str()).collect();
    println!("Chart types: {} (current: {})", names.join(", "), session.chart_type());
    let Some(input) = prompt("Chart type: ") else {
        return;
    };
    let chart_type = match input.parse::<ChartType>() {
        Ok(t) => t,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    match session.set_chart_type(chart_type) {
        Ok(Some(view)) => print_view(&view),
        Ok(None) => println!("Chart type set to {}.\n", chart_type),
        Err(e) => report_render_error(e),
    }
}

fn handle_detect(session: &mut AppSession, config: &Config) {
    if session.detect_status() == DetectStatus::Detecting {
        println!("Detection already in progress.\n");
        return;
    }
    let token = session.begin_detection();
    println!("Detecting...");
    let http = ReqwestHttp;
    let geocoder = Nominatim::new(&http, config.geocode_url.as_str());
    let outcome = detect(&FixedLocator(config.coords), &geocoder, session.districts());
    match session.apply_detection(token, outcome) {
        Ok(DetectionReport::Selected { detected, view, .. }) => {
            println!("Detected District: {}", detected);
            print_view(&view);
        }
        Ok(DetectionReport::NotListed { detected }) => {
            println!("{} detected, but not found in the available districts list.\n", detected);
        }
        Ok(DetectionReport::Failed(AppError::Geolocation(e))) => println!("{}\n", e),
        Ok(DetectionReport::Failed(e)) => {
            error!("location detection failed: {}", e);
            println!("Error detecting district. Try again.\n");
        }
        Ok(DetectionReport::Stale) => {}
        Err(e) => report_render_error(e),
    }
}

fn handle_export(session: &AppSession, config: &Config) {
    let (Some(district), Some(data)) = (session.selected(), session.current_chart()) else {
        println!("Nothing to export. Select a district with data first.\n");
        return;
    };
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let base = district.replace(|c: char| !c.is_alphanumeric(), "_");
    let csv_path = config.export_dir.join(format!("{}_{}.csv", base, stamp));
    let json_path = config.export_dir.join(format!("{}_{}.json", base, stamp));

    let result = export_csv(&csv_path, &data).and_then(|_| write_json(&json_path, &data));
    match result {
        Ok(()) => println!(
            "Chart data exported to {} and {}\n",
            csv_path.display(),
            json_path.display()
        ),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn main() {
    init_tracing();
    let config = match Config::from_env_and_args(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n\n{}", e, HELP);
            std::process::exit(2);
        }
    };
    if config.show_help {
        println!("{}", HELP);
        return;
    }

    let mut session = handle_load(&config);
    loop {
        println!("MGNREGA District Report");
        println!("[1] Reload data");
        println!("[2] Select district");
        println!("[3] Change chart type");
        println!("[4] Detect my district");
        println!("[5] Export current chart data");
        println!("[6] Exit\n");
        // Closed stdin ends the session like option 6.
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        if choice == "1" {
            session = handle_load(&config);
            continue;
        }
        if choice == "6" {
            println!("Exiting the program.");
            break;
        }
        let Some(s) = session.as_mut() else {
            println!("Error: No data loaded. Please load the data first (option 1).\n");
            continue;
        };
        match choice.as_str() {
            "2" => handle_select(s),
            "3" => handle_chart_type(s),
            "4" => handle_detect(s, &config),
            "5" => handle_export(s, &config),
            _ => println!("Invalid choice. Please enter 1 to 6.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_trimmed_stops_at_end_of_input() {
        let mut input = Cursor::new("  2 \nPune\n");
        assert_eq!(read_trimmed(&mut input).as_deref(), Some("2"));
        assert_eq!(read_trimmed(&mut input).as_deref(), Some("Pune"));
        assert_eq!(read_trimmed(&mut input), None);
    }

    #[test]
    fn blank_line_is_not_end_of_input() {
        let mut input = Cursor::new("\n");
        assert_eq!(read_trimmed(&mut input).as_deref(), Some(""));
        assert_eq!(read_trimmed(&mut input), None);
    }
}
