mod common;

use anyhow::Result;
use dashboard_api_rust::filter::{FilterError, ListQuery};
use dashboard_api_rust::services::{ServiceError, ValidationError};

async fn seeded() -> Result<common::TestApp> {
    let app = common::TestApp::new();
    app.seed_component("a", "Rain gauges", &[]).await?;
    app.seed_component("b", "Bus stops", &[]).await?;
    app.seed_component("c", "Rainfall history", &[]).await?;
    app.seed_component("d", "Parks", &[]).await?;
    app.seed_component("e", "Bike lanes", &[]).await?;
    Ok(app)
}

fn indexes(rows: &[dashboard_api_rust::database::models::Component]) -> Vec<&str> {
    rows.iter().map(|c| c.index.as_str()).collect()
}

#[tokio::test]
async fn in_mode_returns_exactly_the_listed_values() -> Result<()> {
    let app = seeded().await?;
    let page = app
        .service()
        .list(&ListQuery {
            filterby: Some("index".into()),
            filtermode: Some("in".into()),
            filtervalue: Some("a,c,zz".into()),
            ..Default::default()
        })
        .await?;

    assert_eq!(indexes(&page.rows), vec!["a", "c"]);
    assert_eq!(page.matched, 2);
    assert_eq!(page.total, 5);
    Ok(())
}

#[tokio::test]
async fn unknown_filter_mode_is_rejected() -> Result<()> {
    let app = seeded().await?;
    let err = app
        .service()
        .list(&ListQuery {
            filterby: Some("index".into()),
            filtermode: Some("xyz".into()),
            filtervalue: Some("a".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Filter(FilterError::InvalidFilterMode(ref m))) if m == "xyz"
    ));
    Ok(())
}

#[tokio::test]
async fn non_positive_page_size_returns_every_match() -> Result<()> {
    let app = seeded().await?;
    for pagesize in [0, -1] {
        let page = app
            .service()
            .list(&ListQuery { pagesize: Some(pagesize), pagenum: Some(4), ..Default::default() })
            .await?;
        assert_eq!(page.rows.len(), 5);
    }
    Ok(())
}

#[tokio::test]
async fn pages_follow_offset_and_stay_consistent_with_matched() -> Result<()> {
    let app = seeded().await?;
    let mut seen = Vec::new();
    for pagenum in 1..=3 {
        let page = app
            .service()
            .list(&ListQuery {
                pagesize: Some(2),
                pagenum: Some(pagenum),
                sort: Some("name".into()),
                ..Default::default()
            })
            .await?;
        assert!(page.rows.len() <= 2);
        assert_eq!(page.matched, 5);
        seen.extend(page.rows.into_iter().map(|c| c.name));
    }
    assert_eq!(
        seen,
        vec!["Bike lanes", "Bus stops", "Parks", "Rain gauges", "Rainfall history"]
    );

    let beyond = app
        .service()
        .list(&ListQuery { pagesize: Some(2), pagenum: Some(9), ..Default::default() })
        .await?;
    assert!(beyond.rows.is_empty());
    assert_eq!(beyond.matched, 5);
    Ok(())
}

#[tokio::test]
async fn searches_and_filters_combine_with_and() -> Result<()> {
    let app = seeded().await?;
    let page = app
        .service()
        .list(&ListQuery {
            searchbyname: Some("Rain".into()),
            filterby: Some("index".into()),
            filtermode: Some("ne".into()),
            filtervalue: Some("a".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(indexes(&page.rows), vec!["c"]);
    assert_eq!(page.matched, 1);
    assert_eq!(page.total, 5);
    Ok(())
}

#[tokio::test]
async fn descending_sort_and_unknown_order_token() -> Result<()> {
    let app = seeded().await?;
    let desc = app
        .service()
        .list(&ListQuery { sort: Some("index".into()), order: Some("DESC".into()), ..Default::default() })
        .await?;
    assert_eq!(indexes(&desc.rows), vec!["e", "d", "c", "b", "a"]);

    let fallback = app
        .service()
        .list(&ListQuery { sort: Some("index".into()), order: Some("sideways".into()), ..Default::default() })
        .await?;
    assert_eq!(indexes(&fallback.rows), vec!["a", "b", "c", "d", "e"]);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() -> Result<()> {
    let app = seeded().await?;
    let err = app
        .service()
        .list(&ListQuery { sort: Some("map_config_ids".into()), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Filter(FilterError::UnknownColumn(_)))
    ));
    Ok(())
}
