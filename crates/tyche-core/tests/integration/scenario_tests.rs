use chrono::NaiveDate;
use tyche_core::{ExtractionMethod, Game};

use crate::integration::common::{
    Quiet, SCENARIO_A, SCENARIO_B, SCENARIO_C, SCENARIO_D, as_of, capture, pipeline,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn powerball_json_endpoint() {
    let dataset = pipeline().run(
        &[capture("https://www.powerball.com/api/v1/numbers/powerball/recent", SCENARIO_A)],
        &Quiet,
    );

    assert_eq!(dataset.records.len(), 1);
    let record = &dataset.records[0];
    assert_eq!(record.game, Game::Powerball);
    assert_eq!(record.date, date(2025, 9, 13));
    assert_eq!(record.numbers, vec![1, 12, 23, 34, 45]);
    assert_eq!(record.bonus, 10);
    assert_eq!(record.extraction_method, ExtractionMethod::Json);
    assert_eq!(record.fetched_at, Some(as_of() - chrono::Duration::days(1)));
}

#[test]
fn mega_millions_asmx_envelope() {
    let dataset = pipeline().run(
        &[capture(
            "https://www.megamillions.com/cmspages/utilservice.asmx/GetLatestDrawData",
            SCENARIO_B,
        )],
        &Quiet,
    );

    assert_eq!(dataset.records.len(), 1);
    let record = &dataset.records[0];
    assert_eq!(record.game, Game::MegaMillions);
    assert_eq!(record.date, date(2025, 9, 12));
    assert_eq!(record.numbers, vec![5, 10, 15, 20, 25]);
    assert_eq!(record.bonus, 7);
}

#[test]
fn soft_404_yields_nothing() {
    for url in [
        "https://www.powerball.com/missing",
        "https://www.mdlottery.com/missing",
        "https://example.org/missing",
    ] {
        let dataset = pipeline().run(&[capture(url, SCENARIO_C)], &Quiet);
        assert!(dataset.records.is_empty(), "{url} produced records");
        assert_eq!(dataset.stats.soft_404, 1);
    }
}

#[test]
fn rendered_text_on_unknown_host() {
    let dataset = pipeline().run(
        &[capture("https://news.example.org/lottery/tonight", SCENARIO_D)],
        &Quiet,
    );

    assert_eq!(dataset.records.len(), 1);
    let record = &dataset.records[0];
    assert_eq!(record.game, Game::Powerball);
    assert_eq!(record.date, date(2025, 9, 10));
    assert_eq!(record.numbers, vec![1, 12, 23, 34, 45]);
    assert_eq!(record.bonus, 10);
    assert_eq!(record.extraction_method, ExtractionMethod::Html);
    assert_eq!(dataset.stats.per_lane["rendered_text"], 1);
}

#[test]
fn state_lottery_page_yields_several_games() {
    let page = r#"<html><body>
        <section><h3>Lucky for Life</h3><p>Sep 12, 2025</p><p>2 9 17 33 41 Lucky Ball 12</p></section>
        <section><h3>Lotto America</h3><p>09/13/2025</p><p>3 14 22 40 51 Star Ball 7</p></section>
    </body></html>"#;
    let dataset = pipeline().run(&[capture("https://www.rilot.com/en-us/", page)], &Quiet);

    let games: Vec<Game> = dataset.records.iter().map(|r| r.game).collect();
    assert_eq!(games, vec![Game::LottoAmerica, Game::LuckyForLife]);
    assert_eq!(dataset.records[0].date, date(2025, 9, 13));
    assert_eq!(dataset.records[1].date, date(2025, 9, 12));
}
