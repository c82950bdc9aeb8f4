//! End-to-end gallery flows: startup, search, selection and failures,
//! driven through the `UserInput` handlers and applied to the view state.

mod common;

use common::*;
use pokedex_gallery::controller::{Controller, SearchOutcome, Update, UserInput, LOAD_FAILED, SEARCH_FAILED};
use pokedex_gallery::models::IndexEntry;
use pokedex_gallery::ui::{App, Status};
use pokedex_gallery::utils::{detail_lines, SpriteThumb};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn controller(entries: &[IndexEntry], page_size: usize) -> Controller<FakeTransport> {
    Controller::new(Arc::new(catalog(entries, 1300)), page_size)
}

fn big_index(n: u32) -> Vec<IndexEntry> {
    (1..=n).map(|id| entry(&format!("mon{}", id), id)).collect()
}

fn searched(update: Update) -> SearchOutcome {
    match update {
        Update::Search { outcome, .. } => outcome,
        other => panic!("expected a search outcome, got {:?}", other),
    }
}

fn card_ids(outcome: &SearchOutcome) -> Vec<u32> {
    match outcome {
        SearchOutcome::Cards(cards) => cards.iter().map(|c| c.record.id).collect(),
        other => panic!("expected cards, got {:?}", other),
    }
}

#[tokio::test]
async fn startup_shows_first_page_and_click_reuses_cache() {
    let entries = big_index(1300);
    let ctl = controller(&entries, 20);
    let mut app = App::new();

    app.apply(ctl.on_startup().await);

    assert_eq!(ctl.fetcher().index().map(|i| i.len()), Some(1300));
    assert_eq!(app.status, Status::Ready);
    assert_eq!(app.cards.len(), 20);
    let ids: Vec<u32> = app.cards.iter().map(|c| c.record.id).collect();
    assert_eq!(ids, (1..=20).collect::<Vec<u32>>());
    assert_eq!(ctl.fetcher().cached_len(), 20);

    // Click the 5th card.
    app.selected_visible = 4;
    let card = app.selected_card().unwrap().clone();
    app.apply(ctl.on_item_select(&card.entry).await);

    assert_eq!(ctl.fetcher().transport().calls_to(&detail_url(5)), 1);
    let detail = app.detail.clone().unwrap();
    assert_eq!(
        detail_lines(&detail),
        vec![
            "Mon5 (#5)",
            "Type: grass, poison",
            "Height: 0.7 m",
            "Weight: 6.9 kg",
            "Stats:",
            "hp: 45",
            "attack: 49",
            "speed: 45",
        ]
    );
}

#[tokio::test]
async fn numeric_query_matches_id_exactly_or_digit_in_name() {
    let entries = vec![
        entry("bulbasaur", 1),
        entry("caterpie", 10),
        entry("voltorb", 100),
        entry("onix", 95),
        entry("porygon1", 137),
    ];
    let ctl = controller(&entries, 20);
    ctl.on_startup().await;

    let outcome = searched(ctl.on_query_change(1, "1").await);

    assert_eq!(card_ids(&outcome), vec![1, 137]);
}

#[tokio::test]
async fn numeric_query_finds_entry_outside_first_page() {
    let entries = big_index(30);
    let ctl = controller(&entries, 20);
    ctl.on_startup().await;

    let outcome = searched(ctl.on_query_change(1, "25").await);

    assert_eq!(card_ids(&outcome), vec![25]);
}

#[tokio::test]
async fn name_query_is_a_substring_match() {
    let entries = vec![entry("pichu", 172), entry("pikachu", 25), entry("raichu", 26)];
    let ctl = controller(&entries, 20);
    ctl.on_startup().await;

    let outcome = searched(ctl.on_query_change(1, " PIKA").await);

    assert_eq!(card_ids(&outcome), vec![25]);
}

#[tokio::test]
async fn clearing_the_query_restores_the_first_page() {
    let entries = big_index(40);
    let ctl = controller(&entries, 20);
    let mut app = App::new();
    app.apply(ctl.on_startup().await);
    let first_page = app.cards.clone();

    let g = app.next_generation();
    app.search_query = "mon3".into();
    app.apply(ctl.on_query_change(g, "mon3").await);
    assert_eq!(app.cards.len(), 11);
    app.apply(Update::Selected(app.cards[0].record.clone()));

    let g = app.next_generation();
    app.search_query.clear();
    app.apply(ctl.on_query_change(g, "").await);

    assert_eq!(app.cards, first_page);
    assert_eq!(app.cards.len(), 20);
    assert_eq!(app.detail, None);
}

#[tokio::test]
async fn no_matches_issue_no_detail_requests() {
    let entries = big_index(5);
    let ctl = controller(&entries, 5);
    ctl.on_startup().await;
    let before = ctl.fetcher().transport().total_calls();

    let outcome = searched(ctl.on_query_change(1, "zzz").await);

    assert_eq!(outcome, SearchOutcome::NoResults);
    assert_eq!(ctl.fetcher().transport().total_calls(), before);
}

#[tokio::test]
async fn query_typed_before_startup_finds_matches() {
    let entries = vec![entry("bulbasaur", 1), entry("pikachu", 25), entry("raichu", 26)];
    let ctl = controller(&entries, 3);
    let mut app = App::new();

    let g = app.next_generation();
    app.search_query = "pika".into();
    app.apply(ctl.on_query_change(g, "pika").await);
    app.apply(ctl.on_startup().await);

    assert_eq!(app.status, Status::Ready);
    let ids: Vec<u32> = app.cards.iter().map(|c| c.record.id).collect();
    assert_eq!(ids, vec![25]);
    assert_eq!(app.first_page.len(), 3);
    assert_eq!(ctl.fetcher().transport().calls_to(&index_url(1300)), 1);
}

#[tokio::test]
async fn query_racing_startup_shares_the_index_request() {
    let entries = vec![entry("bulbasaur", 1), entry("pikachu", 25)];
    let ctl = controller(&entries, 2);
    ctl.fetcher().transport().delay(&index_url(1300), Duration::from_millis(30));

    let (loaded, searched_update) = tokio::join!(ctl.on_startup(), ctl.on_query_change(1, "pika"));

    assert!(matches!(loaded, Update::Loaded(ref cards) if cards.len() == 2));
    assert_eq!(card_ids(&searched(searched_update)), vec![25]);
    assert_eq!(ctl.fetcher().transport().calls_to(&index_url(1300)), 1);
}

#[tokio::test]
async fn query_without_an_index_fails_the_search() {
    let ctl = controller(&big_index(3), 3);
    ctl.fetcher().transport().route_once(&index_url(1300), Reply::Status(503));

    let outcome = searched(ctl.on_query_change(1, "mon").await);

    assert_eq!(outcome, SearchOutcome::Failed(SEARCH_FAILED.to_string()));
}

#[tokio::test]
async fn late_selection_for_a_replaced_card_is_dropped() {
    let entries = vec![entry("bulbasaur", 1), entry("pikachu", 25)];
    let ctl = controller(&entries, 2);
    let mut app = App::new();
    app.apply(ctl.on_startup().await);

    // Select bulbasaur, but a search replaces the list before the detail lands.
    let selection = ctl.on_item_select(&entries[0]).await;
    let g = app.next_generation();
    app.search_query = "pika".into();
    app.apply(ctl.on_query_change(g, "pika").await);
    app.apply(selection);

    assert_eq!(app.detail, None);
    assert_eq!(app.cards.len(), 1);
}

#[tokio::test]
async fn search_failure_shows_generic_message() {
    let entries = vec![entry("pikachu", 25), entry("pikipek", 731)];
    let ctl = controller(&entries, 0);
    ctl.on_startup().await;
    ctl.fetcher().transport().route(&detail_url(731), Reply::Status(500));

    let outcome = searched(ctl.on_query_change(1, "pik").await);

    assert_eq!(outcome, SearchOutcome::Failed(SEARCH_FAILED.to_string()));
}

#[tokio::test]
async fn index_failure_fails_startup() {
    let ctl = controller(&big_index(3), 3);
    ctl.fetcher().transport().route_once(&index_url(1300), Reply::Status(502));
    let mut app = App::new();

    app.apply(ctl.on_startup().await);
    assert_eq!(app.status, Status::Error(LOAD_FAILED.to_string()));
    assert!(app.cards.is_empty());

    // Reloading retries the index.
    app.reload();
    app.apply(ctl.on_startup().await);
    assert_eq!(app.status, Status::Ready);
    assert_eq!(app.cards.len(), 3);
}

#[tokio::test]
async fn detail_failure_fails_startup_with_the_same_message() {
    let ctl = controller(&big_index(3), 3);
    ctl.fetcher().transport().route(&detail_url(2), Reply::Status(500));

    assert_eq!(ctl.on_startup().await, Update::Failed(LOAD_FAILED.to_string()));
}

#[tokio::test]
async fn failed_selection_is_reported() {
    let ctl = controller(&[], 20);
    let unknown = entry("ghost", 9999);

    assert_eq!(ctl.on_item_select(&unknown).await, Update::Failed(LOAD_FAILED.to_string()));
}

#[tokio::test]
async fn selection_loads_the_sprite_thumbnail() {
    let entries = vec![entry("bulbasaur", 1)];
    let ctl = controller(&entries, 1);
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 30])))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .unwrap();
    ctl.fetcher().transport().route(&sprite_url(1), Reply::Body(png));

    let record = match ctl.on_item_select(&entries[0]).await {
        Update::Selected(record) => record,
        other => panic!("expected selection, got {:?}", other),
    };
    let update = ctl.load_sprite(&record).await.unwrap();

    let mut app = App::new();
    app.apply(update);
    let rows = app.get_sprite_pixels(1, 4, 4).unwrap();
    assert_eq!(rows.len(), 4);
    assert!(matches!(
        app.sprite_cache.get(&1),
        Some(SpriteThumb { w: 48, h: 48, .. })
    ));

    // Second load comes from the sprite cache.
    ctl.load_sprite(&record).await.unwrap();
    assert_eq!(ctl.fetcher().transport().calls_to(&sprite_url(1)), 1);
}
