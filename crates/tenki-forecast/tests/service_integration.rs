//! Integration tests for ForecastService using wiremock and an on-disk cache.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use tenki_core::{ApiConfig, CacheConfig, Config};
use tenki_forecast::{ForecastCache, ForecastRecord, ForecastService, TEMP_PLACEHOLDER};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKYO: &str = include_str!("fixtures/forecast_130000.json");

fn config_for(server: &MockServer, dir: &TempDir, ttl_minutes: u32) -> Config {
    Config {
        config_dir: dir.path().to_path_buf(),
        api: ApiConfig {
            area_url: format!("{}/bosai/common/const/area.json", server.uri()),
            forecast_url_base: format!("{}/bosai/forecast/data/forecast", server.uri()),
            ..ApiConfig::default()
        },
        cache: CacheConfig {
            db_file: "weather.db".to_string(),
            cache_ttl_minutes: ttl_minutes,
        },
    }
}

async fn mount_tokyo(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/bosai/forecast/data/forecast/130000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKYO))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn stale_snow() -> ForecastRecord {
    ForecastRecord {
        region_code: "130000".to_string(),
        date: "2024-01-10".to_string(),
        weather: "雪".to_string(),
        weather_code: "400".to_string(),
        wind: "北の風".to_string(),
        max_temp: "3".to_string(),
        min_temp: "-2".to_string(),
    }
}

#[tokio::test]
async fn test_known_region_returns_full_forecast() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 1).await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    let record = service.forecast("130000").await.unwrap();

    assert!(!record.weather.is_empty());
    assert_eq!(record.weather, "晴れ 時々 くもり");
    assert!(record.has_temperatures());
    assert_eq!(record.max_temp, "25");
    assert_eq!(
        service.icon_url(&record).as_deref(),
        Some("https://www.jma.go.jp/bosai/forecast/img/101.png")
    );
}

#[tokio::test]
async fn test_invalid_region_returns_none() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bosai/forecast/data/forecast/999999.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();

    assert!(service.forecast("999999").await.is_none());
    assert!(service.fetch_fresh("999999").await.is_none());
    let cache = service.cache().unwrap();
    assert_eq!(cache.forecast_count("999999").unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_server_returns_none() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = config_for(&server, &dir, 60);
    drop(server);

    let service = ForecastService::new(&config).unwrap();
    assert!(service.forecast("130000").await.is_none());
    assert!(service.regions().await.is_empty());
}

#[tokio::test]
async fn test_fresh_cache_skips_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 1).await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    let first = service.forecast("130000").await.unwrap();
    let second = service.forecast("130000").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(service.cache().unwrap().forecast_count("130000").unwrap(), 1);
}

#[tokio::test]
async fn test_stale_cache_refetches_and_appends() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 1).await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    let cache = service.cache().unwrap();
    cache
        .store_forecast_at(&stale_snow(), Utc::now() - Duration::hours(2))
        .unwrap();

    let record = service.forecast("130000").await.unwrap();

    assert_eq!(record.weather, "晴れ 時々 くもり");
    assert_eq!(cache.forecast_count("130000").unwrap(), 2);
    assert_eq!(
        cache.latest_forecast("130000").unwrap().unwrap().record,
        record
    );
}

#[tokio::test]
async fn test_failed_refetch_serves_stale_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bosai/forecast/data/forecast/130000.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    service
        .cache()
        .unwrap()
        .store_forecast_at(&stale_snow(), Utc::now() - Duration::hours(2))
        .unwrap();

    let record = service.forecast("130000").await.unwrap();
    assert_eq!(record, stale_snow());
}

#[tokio::test]
async fn test_zero_ttl_always_refetches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 2).await;

    let service = ForecastService::new(&config_for(&server, &dir, 0)).unwrap();
    service.forecast("130000").await.unwrap();
    service.forecast("130000").await.unwrap();

    assert_eq!(service.cache().unwrap().forecast_count("130000").unwrap(), 2);
}

#[tokio::test]
async fn test_refresh_bypasses_fresh_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 2).await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    service.forecast("130000").await.unwrap();
    service.refresh("130000").await.unwrap();

    assert_eq!(service.cache().unwrap().forecast_count("130000").unwrap(), 2);
}

#[tokio::test]
async fn test_regions_are_cached_without_duplicates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bosai/common/const/area.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "offices": {
                "130000": {"name": "東京都"},
                "270000": {"name": "大阪府"}
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    assert_eq!(service.regions().await.len(), 2);
    assert_eq!(service.regions().await.len(), 2);

    assert_eq!(service.cache().unwrap().region_count().unwrap(), 2);
    assert_eq!(service.region_name("270000").as_deref(), Some("大阪府"));
}

#[tokio::test]
async fn test_regions_fall_back_to_cache_when_offline() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bosai/common/const/area.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config_for(&server, &dir, 60);
    {
        let cache = ForecastCache::new(config.db_path()).unwrap();
        cache
            .store_regions(&[tenki_forecast::Region {
                code: "130000".to_string(),
                name: "東京都".to_string(),
            }])
            .unwrap();
    }

    let service = ForecastService::new(&config).unwrap();
    let regions = service.regions().await;

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].name, "東京都");
}

#[tokio::test]
async fn test_cache_persists_across_reopen() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 1).await;

    let config = config_for(&server, &dir, 60);
    let fetched = {
        let service = ForecastService::new(&config).unwrap();
        service.forecast("130000").await.unwrap()
    };

    let reopened = ForecastService::new(&config).unwrap();
    assert_eq!(reopened.forecast("130000").await.unwrap(), fetched);
}

#[tokio::test]
async fn test_service_without_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 2).await;

    let config = config_for(&server, &dir, 60);
    let service = ForecastService::without_cache(&config.api).unwrap();

    assert!(service.cache().is_none());
    assert!(service.forecast("130000").await.is_some());
    assert!(service.forecast("130000").await.is_some());
    assert!(service.region_name("130000").is_none());
    assert!(!config.db_path().exists());
}

#[tokio::test]
async fn test_daily_forecast() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_tokyo(&server, 1).await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    let days = service.daily("130000").await;

    assert_eq!(days.len(), 3);
    assert_eq!(days[1].weather, "くもり");
    assert_eq!(days[1].min_temp, TEMP_PLACEHOLDER);
}

#[tokio::test]
async fn test_daily_forecast_for_invalid_region_is_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bosai/forecast/data/forecast/abc.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = ForecastService::new(&config_for(&server, &dir, 60)).unwrap();
    assert!(service.daily("abc").await.is_empty());
}
