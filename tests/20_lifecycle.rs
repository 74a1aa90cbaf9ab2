mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use dashboard_api_rust::database::models::{ChartConfigFields, ComponentFields};
use dashboard_api_rust::events::{ComponentEvent, EventBus, LifecycleEvent, LifecycleObserver, ObserverError};
use dashboard_api_rust::filter::ListQuery;
use dashboard_api_rust::services::ServiceError;

#[tokio::test]
async fn update_of_missing_component_creates_nothing() -> Result<()> {
    let app = common::TestApp::new();
    let err = app
        .service()
        .update(77, ComponentFields { name: "Ghost".into(), ..Default::default() })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(app.store.component_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn update_replaces_all_metadata() -> Result<()> {
    let app = common::TestApp::new();
    let id = app.seed_component("rain", "Rain", &[]).await?;
    let before = app.service().get(id).await?;
    assert_eq!(before.source.as_deref(), Some("Transport Bureau"));

    let updated = app
        .service()
        .update(
            id,
            ComponentFields {
                name: "Rainfall".into(),
                update_freq: Some(10),
                update_freq_unit: Some("minute".into()),
                links: vec!["https://data.example.org/rain".into()],
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(updated.index, "rain");
    assert_eq!(updated.name, "Rainfall");
    assert_eq!(updated.source, None);
    assert_eq!(updated.update_freq, Some(10));
    assert_eq!(updated.links.len(), 1);
    assert!(updated.updated_at >= before.updated_at);
    assert_eq!(updated.created_at, before.created_at);
    Ok(())
}

#[tokio::test]
async fn chart_update_creates_then_replaces() -> Result<()> {
    let app = common::TestApp::new();
    let id = app.seed_component("rain", "Rain", &[]).await?;
    assert!(app.service().get(id).await?.chart_config.is_none());

    let chart = app
        .service()
        .update_chart_config(
            id,
            ChartConfigFields { color: vec!["#fff".into()], types: vec!["BarChart".into()], unit: Some("mm".into()) },
        )
        .await?;
    assert_eq!(chart.index, "rain");

    app.service()
        .update_chart_config(id, ChartConfigFields { unit: Some("cm".into()), ..Default::default() })
        .await?;

    let component = app.service().get(id).await?;
    let stored = component.chart_config.expect("chart attached");
    assert_eq!(stored.unit.as_deref(), Some("cm"));
    assert!(stored.color.is_empty());
    assert_eq!(app.store.chart_config_indexes().await, vec!["rain".to_string()]);
    Ok(())
}

#[tokio::test]
async fn chart_update_of_missing_component_is_not_found() -> Result<()> {
    let app = common::TestApp::new();
    let err = app
        .service()
        .update_chart_config(5, ChartConfigFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(app.store.chart_config_indexes().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn map_update_is_seen_by_every_referrer() -> Result<()> {
    let app = common::TestApp::new();
    let map = app.seed_map("bus").await?;
    let a = app.seed_component("a", "A", &[map.id]).await?;
    let b = app.seed_component("b", "B", &[map.id]).await?;

    let mut fields = common::map_fields("bus");
    fields.title = "Bus stops (2024)".into();
    let updated = app.service().update_map_config(map.id, fields).await?;
    assert_eq!(updated.id, map.id);
    assert_eq!(updated.title, "Bus stops (2024)");

    assert_eq!(app.service().get(a).await?.map_config_ids, vec![map.id]);
    assert_eq!(app.service().get(b).await?.map_config_ids, vec![map.id]);
    assert_eq!(app.store.map_config_ids().await, vec![map.id]);

    let err = app
        .service()
        .update_map_config(map.id + 100, common::map_fields("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn create_with_new_map_configs_and_chart() -> Result<()> {
    let app = common::TestApp::new();
    let existing = app.seed_map("shared").await?;

    let mut new = common::new_component("metro", "Metro ridership");
    new.map_config_ids = vec![existing.id];
    new.map_configs = vec![common::map_fields("metro_lines")];
    new.chart_config = Some(ChartConfigFields { types: vec!["LineChart".into()], ..Default::default() });

    let created = app.service().create(new).await?;
    assert_eq!(created.map_config_ids.len(), 2);
    assert_eq!(created.map_config_ids[0], existing.id);
    assert!(created.chart_config.is_some());
    assert_eq!(app.store.map_config_ids().await.len(), 2);

    let listed = app.service().list(&ListQuery::default()).await?;
    assert_eq!(listed.rows.len(), 1);
    Ok(())
}

struct Recorder(Arc<Mutex<Vec<ComponentEvent>>>);

#[async_trait]
impl LifecycleObserver for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn notify(&self, event: &LifecycleEvent) -> Result<(), ObserverError> {
        self.0.lock().map_err(|e| ObserverError::Failed(e.to_string()))?.push(event.kind.clone());
        Ok(())
    }
}

#[tokio::test]
async fn lifecycle_events_follow_commits() -> Result<()> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let app = common::TestApp::with_events(EventBus::new().with_observer(Arc::new(Recorder(events.clone()))));

    let id = app.seed_component("rain", "Rain", &[]).await?;
    app.service().delete(id).await?;
    // Failed operations publish nothing
    assert!(app.service().delete(id).await.is_err());

    // Observers run in the background
    for _ in 0..50 {
        if events.lock().unwrap().len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let seen = events.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(matches!(seen[0], ComponentEvent::Created { .. }) || matches!(seen[1], ComponentEvent::Created { .. }));
    assert!(seen.iter().any(|e| matches!(e, ComponentEvent::Deleted { id: d, .. } if *d == id)));
    Ok(())
}
