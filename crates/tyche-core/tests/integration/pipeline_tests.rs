use tyche_core::output::{write_csv, write_json};
use tyche_core::{CandidateRecord, ExtractionMethod, Game, RawCapture};

use crate::integration::common::{
    MockVision, Quiet, SCENARIO_A, SCENARIO_B, SCENARIO_D, capture, pipeline, pipeline_with_vision,
};

fn powerball_json(date: &str) -> String {
    format!(
        r#"{{"field_draw_date":"{date}","field_winning_numbers":"01 12 23 34 45","field_powerball":"10"}}"#
    )
}

fn vision_candidate(date: &str) -> CandidateRecord {
    CandidateRecord::new(
        Game::Powerball,
        date,
        vec![1, 12, 23, 34, 45],
        Some(10),
        "",
        ExtractionMethod::Vision,
    )
}

#[test]
fn dedup_keeps_json_over_html() {
    // Same draw: the text page is listed first so the JSON record must displace it.
    let html = SCENARIO_D.replace("09/10/2025", "09/13/2025");
    let captures = [
        capture("https://news.example.org/pb", &html),
        capture("https://www.powerball.com/api", SCENARIO_A),
    ];
    let dataset = pipeline().run(&captures, &Quiet);

    assert_eq!(dataset.records.len(), 1);
    assert_eq!(dataset.records[0].extraction_method, ExtractionMethod::Json);
    assert_eq!(dataset.records[0].source_url, "https://www.powerball.com/api");
    assert_eq!(dataset.stats.duplicates, 1);
}

#[test]
fn recency_window_is_enforced_for_every_lane() {
    // as_of is 2025-09-14 with a 14 day window
    let stale_json = capture("https://www.powerball.com/api", &powerball_json("08/30/2025"));
    let stale_text = capture(
        "https://news.example.org/pb",
        &SCENARIO_D.replace("09/10/2025", "08/30/2025"),
    );
    let edge = capture("https://powerball.com/api", &powerball_json("08/31/2025"));

    let dataset = pipeline().run(&[stale_json, stale_text, edge], &Quiet);
    assert_eq!(dataset.records.len(), 1);
    assert_eq!(dataset.records[0].date.to_string(), "2025-08-31");
    assert!(dataset.stats.rejected >= 2);
}

#[test]
fn future_dates_are_rejected() {
    let dataset = pipeline().run(
        &[capture("https://www.powerball.com/api", &powerball_json("09/20/2025"))],
        &Quiet,
    );
    assert!(dataset.records.is_empty());
}

#[test]
fn output_is_deterministic() {
    let captures: Vec<RawCapture> = vec![
        capture("https://news.example.org/pb", SCENARIO_D),
        capture("https://www.megamillions.com/asmx", SCENARIO_B),
        capture("https://www.powerball.com/api", SCENARIO_A),
        capture("https://powerball.com/api", SCENARIO_A),
    ];

    let render = || {
        let dataset = pipeline().run(&captures, &Quiet);
        let mut json = Vec::new();
        write_json(&mut json, &dataset.records).unwrap();
        let mut csv = Vec::new();
        write_csv(&mut csv, &dataset.records).unwrap();
        (json, csv)
    };

    let first = render();
    let second = render();
    assert_eq!(first, second);

    let dataset = pipeline().run(&captures, &Quiet);
    let dates: Vec<String> = dataset.records.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-09-13", "2025-09-12", "2025-09-10"]);
}

#[test]
fn first_valid_lane_short_circuits() {
    let vision = MockVision::returning(vec![vision_candidate("09/13/2025")]);
    let pipeline = pipeline_with_vision(vision.clone());
    let c = capture("https://www.powerball.com/api", SCENARIO_A).with_screenshot("/tmp/pb.full.png");

    let dataset = pipeline.run(&[c], &Quiet);
    assert_eq!(dataset.records.len(), 1);
    assert_eq!(dataset.records[0].extraction_method, ExtractionMethod::Json);
    assert!(vision.calls().is_empty());
}

#[test]
fn vision_is_the_last_resort() {
    let vision = MockVision::returning(vec![vision_candidate("2025-09-13")]);
    let pipeline = pipeline_with_vision(vision.clone());
    let c = capture("https://www.powerball.com/", "<html><body><canvas></canvas></body></html>")
        .with_screenshot("/tmp/pb.full.png");

    let dataset = pipeline.run(&[c], &Quiet);
    assert_eq!(vision.calls().len(), 1);
    assert_eq!(dataset.records.len(), 1);
    assert_eq!(dataset.records[0].extraction_method, ExtractionMethod::Vision);
    assert_eq!(dataset.records[0].source_url, "https://www.powerball.com/");
}

#[test]
fn failing_lane_does_not_stop_the_batch() {
    let vision = MockVision::failing();
    let pipeline = pipeline_with_vision(vision.clone());
    let captures = [
        capture("https://www.powerball.com/", "<html><body></body></html>")
            .with_screenshot("/tmp/pb.full.png"),
        capture("https://www.megamillions.com/asmx", SCENARIO_B),
    ];

    let dataset = pipeline.run(&captures, &Quiet);
    assert_eq!(vision.calls().len(), 1);
    assert_eq!(dataset.records.len(), 1);
    assert_eq!(dataset.records[0].game, Game::MegaMillions);
    assert_eq!(dataset.stats.unresolved, 1);
}

#[test]
fn csv_numbers_column_round_trips() {
    let dataset = pipeline().run(
        &[
            capture("https://www.powerball.com/api", SCENARIO_A),
            capture("https://www.megamillions.com/asmx", SCENARIO_B),
        ],
        &Quiet,
    );
    let mut out = Vec::new();
    write_csv(&mut out, &dataset.records).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let rows: Vec<Vec<u32>> = reader
        .records()
        .map(|row| {
            row.unwrap()[2]
                .split_whitespace()
                .map(|n| n.parse().unwrap())
                .collect()
        })
        .collect();
    let expected: Vec<Vec<u32>> = dataset.records.iter().map(|r| r.all_numbers()).collect();
    assert_eq!(rows, expected);
}
