mod common;

use std::sync::Arc;

use common::fixtures::{png_asset, text_asset};
use common::mock_api::{Call, MockApi, Reply, BASE};
use facelab_client::api::{BackgroundMode, RgbColor};
use facelab_client::tools::{preset_color, BackgroundRemovalTool};
use facelab_client::ClientError;

#[tokio::test]
async fn processing_without_image_is_a_validation_error() {
    let api = Arc::new(MockApi::default());
    let mut tool = BackgroundRemovalTool::new(api.clone());
    assert_eq!(tool.set_image(vec![text_asset("a.txt")]), 0);
    assert!(matches!(tool.process().await, Err(ClientError::Validation { .. })));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn colors_toggle_and_are_sent_only_in_color_mode() {
    let api = Arc::new(MockApi {
        background: Reply::Ok(vec!["/static/out_0.png".into(), "https://cdn.test/out_1.png".into()]),
        ..Default::default()
    });
    let mut tool = BackgroundRemovalTool::new(api.clone());
    tool.set_image(vec![png_asset("me.png", 8, 8)]);

    let white = preset_color("White").unwrap();
    let blue = preset_color("Blue").unwrap();
    assert!(tool.toggle_color(white));
    assert!(tool.toggle_color(blue));
    assert!(tool.toggle_color(RgbColor::new(1, 2, 3)));
    assert!(!tool.toggle_color(RgbColor::new(1, 2, 3)));
    assert_eq!(tool.colors(), [white, blue]);

    tool.process().await.unwrap();
    tool.set_mode(BackgroundMode::Color);
    let results = tool.process().await.unwrap().to_vec();

    assert_eq!(
        api.calls(),
        vec![
            Call::RemoveBackground { mode: "transparent".into(), colors: None, background: false },
            Call::RemoveBackground {
                mode: "color".into(),
                colors: Some("255,255,255|59,130,246".into()),
                background: false,
            },
        ]
    );
    assert_eq!(results[0].url, format!("{BASE}/static/out_0.png"));
    assert_eq!(results[1].url, "https://cdn.test/out_1.png");
    assert_eq!(results[0].file_name, "background-removed-1.png");
    assert_eq!(results[1].file_name, "background-removed-2.png");
}

#[tokio::test]
async fn background_image_only_travels_in_image_mode() {
    let api = Arc::new(MockApi::default());
    let mut tool = BackgroundRemovalTool::new(api.clone());
    tool.set_image(vec![png_asset("me.png", 8, 8)]);
    tool.set_background(vec![png_asset("beach.png", 8, 8)]);

    tool.set_mode(BackgroundMode::Blur);
    tool.process().await.unwrap();
    tool.set_mode(BackgroundMode::Image);
    tool.process().await.unwrap();

    let sent: Vec<bool> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::RemoveBackground { background, .. } => Some(background),
            _ => None,
        })
        .collect();
    assert_eq!(sent, [false, true]);
}

#[tokio::test]
async fn failure_is_shown_and_reset_clears_previews() {
    let api = Arc::new(MockApi { background: Reply::Status(500, "model not loaded"), ..Default::default() });
    let mut tool = BackgroundRemovalTool::new(api);
    tool.set_image(vec![png_asset("me.png", 8, 8)]);
    tool.set_background(vec![png_asset("bg.png", 8, 8)]);

    assert!(tool.process().await.is_err());
    assert_eq!(tool.error(), Some("model not loaded"));
    assert!(tool.results().is_empty());
    assert_eq!(tool.previews().live_count(), 2);

    tool.reset();
    assert_eq!(tool.previews().live_count(), 0);
    assert!(tool.image_preview().is_none());
    assert!(tool.error().is_none());
}
