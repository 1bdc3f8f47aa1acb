use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};

use earnings_playbook::models::{EarningsEvent, EarningsTiming, PriceSeries};
use earnings_playbook::service::finance::earnings::{
    classify_session, load_earnings_file, load_event_dates, select_recent,
};
use earnings_playbook::service::finance::history::{
    load_history_csv, parse_chart_payload, save_history_csv,
};
use earnings_playbook::service::finance::FinanceServiceError;
use earnings_playbook::service::tickers::playbook::column_values;
use earnings_playbook::service::tickers::{playbook_column, PlaybookError, TickerSource};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Fresh scratch directory per test so parallel tests never share files.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "earnings-playbook-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[test]
fn session_classification_table() {
    let cases = [
        (Some("bmo"), EarningsTiming::BeforeOpen),
        (Some("Before Market Open"), EarningsTiming::BeforeOpen),
        (Some("pre-market"), EarningsTiming::BeforeOpen),
        (Some("07:30"), EarningsTiming::BeforeOpen),
        (Some("8:00 am"), EarningsTiming::BeforeOpen),
        (Some("AMC"), EarningsTiming::AfterClose),
        (Some("After Market Close"), EarningsTiming::AfterClose),
        (Some("post-market"), EarningsTiming::AfterClose),
        (Some("16:05"), EarningsTiming::AfterClose),
        (Some("4:00 pm"), EarningsTiming::AfterClose),
        (Some("Before Open"), EarningsTiming::BeforeOpen),
        (Some("before-market"), EarningsTiming::BeforeOpen),
        (Some("after_close"), EarningsTiming::AfterClose),
        (Some("After-Hours"), EarningsTiming::AfterClose),
        (Some("time not supplied"), EarningsTiming::Unknown),
        (Some("  "), EarningsTiming::AfterClose),
        (None, EarningsTiming::AfterClose),
    ];

    for (input, expected) in cases {
        assert_eq!(
            classify_session(input, EarningsTiming::AfterClose),
            expected,
            "input {input:?}"
        );
    }

    assert_eq!(
        classify_session(None, EarningsTiming::BeforeOpen),
        EarningsTiming::BeforeOpen
    );
}

#[test]
fn timing_codes_parse_from_text() {
    assert_eq!("BMO".parse::<EarningsTiming>(), Ok(EarningsTiming::BeforeOpen));
    assert_eq!("after".parse::<EarningsTiming>(), Ok(EarningsTiming::AfterClose));
    assert_eq!("tba".parse::<EarningsTiming>(), Ok(EarningsTiming::Unknown));
    assert!("lunchtime".parse::<EarningsTiming>().is_err());
}

#[test]
fn chart_payload_maps_timestamps_to_exchange_dates() {
    // 2024-07-18 and 2024-07-19 09:30 New York, plus a bar with no close
    let raw = br#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "NFLX", "exchangeTimezoneName": "America/New_York"},
                "timestamp": [1721309400, 1721395800, 1721655000],
                "indicators": {
                    "quote": [{
                        "open": [650.1, 640.0, null],
                        "high": [655.0, 641.2, null],
                        "low": [640.0, 630.5, null],
                        "close": [643.04, 633.34, null],
                        "volume": [5000000, 7200000, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    let series = parse_chart_payload(raw, "NFLX", chrono_tz::UTC).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.bars()[0].date, d(2024, 7, 18));
    assert_eq!(series.bars()[0].volume, Some(5_000_000));
    assert_eq!(series.bars()[1].date, d(2024, 7, 19));
    assert_eq!(series.current_price(), Some(633.34));
}

#[test]
fn chart_error_not_found_is_reported() {
    let raw = br#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;

    match parse_chart_payload(raw, "ZZZZ", chrono_tz::America::New_York) {
        Err(FinanceServiceError::NotFound(symbol)) => assert_eq!(symbol, "ZZZZ"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn history_csv_round_trips_through_disk() {
    let dir = scratch_dir("history-roundtrip");
    let path = dir.join("nflx_mon_20240722.csv");

    let series =
        PriceSeries::from_closes([(d(2024, 7, 18), 643.04), (d(2024, 7, 19), 633.34)]).unwrap();
    save_history_csv(&path, &series).unwrap();

    let loaded = load_history_csv(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.bars()[0].close, 643.04);
    assert_eq!(loaded.bars()[1].date, d(2024, 7, 19));
    assert_eq!(loaded.bars()[1].open, None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scraped_history_table_is_normalized() {
    let dir = scratch_dir("history-scraped");
    let path = dir.join("nflx_data.csv");
    fs::write(
        &path,
        "Date,Open,High,Low,Close*,Adj Close**,Volume\n\
         \"Jul 19, 2024\",640.00,641.20,630.50,633.34,633.34,\"7,200,000\"\n\
         \"Jul 18, 2024\",650.10,655.00,640.00,643.04,643.04,\"5,000,000\"\n\
         \"Jul 17, 2024\",-,-,-,-,-,-\n\
         \"Jul 16, 2024\",0.25 Dividend,,,,,\n",
    )
    .unwrap();

    let series = load_history_csv(&path).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.first().unwrap().date, d(2024, 7, 18));
    assert_eq!(series.current_price(), Some(633.34));
    assert_eq!(series.last().unwrap().volume, Some(7_200_000));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn earnings_file_accepts_optional_header_and_timing() {
    let dir = scratch_dir("earnings-file");
    let path = dir.join("earnings.csv");
    fs::write(
        &path,
        "ticker,date,timing\n\
         nflx,2024-07-18,amc\n\
         KO,2024-07-23,bmo\n\
         AXP,2024-07-19\n\
         GE,someday,bmo\n",
    )
    .unwrap();

    let events = load_earnings_file(&path, EarningsTiming::Unknown).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].symbol, "NFLX");
    assert_eq!(events[0].timing, EarningsTiming::AfterClose);
    assert_eq!(events[1].timing, EarningsTiming::BeforeOpen);
    assert_eq!(events[2].symbol, "AXP");
    assert_eq!(events[2].timing, EarningsTiming::Unknown);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn event_dates_file_handles_long_form_dates() {
    let dir = scratch_dir("event-dates");
    let path = dir.join("dates.txt");
    fs::write(
        &path,
        "# NFLX report dates\n\
         April 17, 2025\n\
         January 21, 2025, amc\n\
         2024-10-17,bmo\n\
         \n\
         not a date\n",
    )
    .unwrap();

    let events = load_event_dates(&path, "NFLX", EarningsTiming::AfterClose).unwrap();
    let got: Vec<(NaiveDate, EarningsTiming)> = events.iter().map(|e| (e.date, e.timing)).collect();
    assert_eq!(
        got,
        vec![
            (d(2025, 4, 17), EarningsTiming::AfterClose),
            (d(2025, 1, 21), EarningsTiming::AfterClose),
            (d(2024, 10, 17), EarningsTiming::BeforeOpen),
        ]
    );
    assert!(events.iter().all(|e| e.symbol == "NFLX"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn select_recent_filters_dedups_and_limits() {
    let events = vec![
        EarningsEvent::new("NFLX", d(2024, 1, 23), EarningsTiming::AfterClose),
        EarningsEvent::new("NFLX", d(2024, 4, 18), EarningsTiming::AfterClose),
        EarningsEvent::new("NFLX", d(2024, 4, 18), EarningsTiming::BeforeOpen),
        EarningsEvent::new("KO", d(2024, 4, 30), EarningsTiming::BeforeOpen),
        EarningsEvent::new("NFLX", d(2024, 7, 18), EarningsTiming::AfterClose),
        EarningsEvent::new("NFLX", d(2024, 10, 17), EarningsTiming::AfterClose),
        EarningsEvent::new("NFLX", d(2023, 1, 19), EarningsTiming::AfterClose),
    ];

    let picked = select_recent(&events, "nflx", d(2023, 6, 1), d(2024, 9, 1), 2);
    let dates: Vec<NaiveDate> = picked.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![d(2024, 7, 18), d(2024, 4, 18)]);
    // first occurrence of a duplicated date wins
    assert_eq!(picked[1].timing, EarningsTiming::AfterClose);
}

#[test]
fn playbook_column_matches_weekday_aliases() {
    let sheet = rows(&[
        &["Mon", "Tue", "Weds", "Thur", "Fri"],
        &["ko", "nflx", "ge", "axp", "msft"],
        &["pep", "", "", "nan", ""],
        &["", "", "", "", ""],
    ]);

    assert_eq!(column_values(&sheet, "Mon").unwrap(), vec!["KO", "PEP"]);
    assert_eq!(column_values(&sheet, "Wed").unwrap(), vec!["GE"]);
    assert_eq!(column_values(&sheet, "thu").unwrap(), vec!["AXP"]);

    match column_values(&sheet, "Sat") {
        Err(PlaybookError::MissingColumn { column, available }) => {
            assert_eq!(column, "Sat");
            assert_eq!(available.len(), 5);
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }

    assert!(matches!(column_values(&[], "Mon"), Err(PlaybookError::Empty)));
}

#[test]
fn weekday_columns_skip_weekends() {
    assert_eq!(playbook_column(Weekday::Wed), Some("Wed"));
    assert_eq!(playbook_column(Weekday::Sat), None);
    assert_eq!(playbook_column(Weekday::Sun), None);
}

#[test]
fn csv_playbook_resolves_and_dedups() {
    let dir = scratch_dir("playbook");
    let path = dir.join("playbook.csv");
    fs::write(
        &path,
        "Monday,Tuesday,Wednesday,Thursday,Friday\n\
         ko,nflx,ge,axp,msft\n\
         pep,NFLX,,,\n\
         KO,,,,\n",
    )
    .unwrap();

    let source = TickerSource::for_weekday(path.clone(), "Playbook".to_string(), Weekday::Mon)
        .expect("weekday source");
    assert_eq!(source.label(), "mon");
    assert_eq!(source.resolve().unwrap(), vec!["KO", "PEP"]);

    let tuesday =
        TickerSource::for_weekday(path, "Playbook".to_string(), Weekday::Tue).unwrap();
    assert_eq!(tuesday.resolve().unwrap(), vec!["NFLX"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_ticker_list_is_an_error() {
    let source = TickerSource::Args(vec![" ".to_string(), "nan".to_string()]);
    assert!(matches!(source.resolve(), Err(PlaybookError::NoTickers(_))));

    let fixed = TickerSource::Fixed(vec!["ko".to_string(), "KO".to_string()]);
    assert_eq!(fixed.resolve().unwrap(), vec!["KO"]);
    assert_eq!(fixed.label(), "fixed");
}

#[test]
fn earnings_file_skips_undecodable_rows() {
    let dir = scratch_dir("earnings-file-bad-bytes");
    let path = dir.join("earnings.csv");
    let mut content = b"nflx,2024-07-18,amc\nKO,2024-07-".to_vec();
    content.push(0xff);
    content.extend_from_slice(b"23,bmo\nAXP,2024-07-19\n");
    fs::write(&path, content).unwrap();

    let events = load_earnings_file(&path, EarningsTiming::AfterClose).unwrap();
    let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["NFLX", "AXP"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn history_csv_skips_undecodable_rows() {
    let dir = scratch_dir("history-bad-bytes");
    let path = dir.join("nflx_data.csv");
    let mut content = b"Date,Close\n2024-07-17,648.00\n2024-07-18,6".to_vec();
    content.push(0xff);
    content.extend_from_slice(b"43.04\n2024-07-19,633.34\n");
    fs::write(&path, content).unwrap();

    let series = load_history_csv(&path).unwrap();
    let dates: Vec<NaiveDate> = series.bars().iter().map(|b| b.date).collect();
    assert_eq!(dates, vec![d(2024, 7, 17), d(2024, 7, 19)]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn event_dates_file_skips_undecodable_lines() {
    let dir = scratch_dir("event-dates-bad-bytes");
    let path = dir.join("dates.txt");
    let mut content = b"April 17, 2025\nJan".to_vec();
    content.push(0xff);
    content.extend_from_slice(b" 21, 2025\r\n2024-10-17\n");
    fs::write(&path, content).unwrap();

    let events = load_event_dates(&path, "NFLX", EarningsTiming::AfterClose).unwrap();
    let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![d(2025, 4, 17), d(2024, 10, 17)]);

    let _ = fs::remove_dir_all(&dir);
}
