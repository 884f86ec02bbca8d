mod common;

use common::TestServer;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

// Smallest valid 1x1 PNG.
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

async fn upload(server: &TestServer, auth: &str, recipe: &Value, form: Form) -> reqwest::Response {
    server
        .client
        .post(server.url(&format!(
            "/api/recipe/recipes/{}/upload-image",
            recipe["id"]
        )))
        .header("Authorization", auth)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

fn image_form(bytes: &'static [u8], file_name: &str) -> Form {
    Form::new().part("image", Part::bytes(bytes).file_name(file_name.to_string()))
}

#[tokio::test]
async fn upload_image_to_recipe() {
    let server = TestServer::start().await;
    let auth = server.user("chef@example.com").await;
    let recipe = server.recipe(&auth, json!({})).await;

    let res = upload(&server, &auth, &recipe, image_form(PNG, "photo.png")).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], recipe["id"]);
    let url = body["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/uploads/recipe/"));
    assert!(url.ends_with(".png"));

    let relative = url.trim_start_matches("/media/");
    assert!(server.media_root.path().join(relative).exists());

    // The detail view exposes the same URL and the file is served.
    let detail: Value = server
        .get(&auth, &format!("/api/recipe/recipes/{}", recipe["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["image"], url.as_str());

    let res = server.client.get(server.url(&url)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);

    // Browsers ask for images explicitly.
    for accept in ["image/png", "image/webp,image/apng,image/*;q=0.8"] {
        let res = server
            .client
            .get(server.url(&url))
            .header("Accept", accept)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "Accept: {accept}");
        assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);
    }

    // The API itself still answers JSON only.
    let res = server
        .client
        .get(server.url(&format!("/api/recipe/recipes/{}", recipe["id"])))
        .header("Authorization", &auth)
        .header("Accept", "image/png")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 415);

    // Replacing the image removes the previous file.
    let res = upload(&server, &auth, &recipe, image_form(PNG, "again.png")).await;
    assert_eq!(res.status(), 200);
    assert!(!server.media_root.path().join(relative).exists());

    server.shutdown().await;
}

#[tokio::test]
async fn upload_rejects_bad_requests() {
    let server = TestServer::start().await;
    let auth = server.user("chef@example.com").await;
    let recipe = server.recipe(&auth, json!({})).await;

    let res = upload(&server, &auth, &recipe, image_form(b"notanimage", "fake.png")).await;
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body["errors"]["image"].is_array());

    let form = Form::new().text("caption", "no file here");
    let res = upload(&server, &auth, &recipe, form).await;
    assert_eq!(res.status(), 400);

    let other = server.user("other@example.com").await;
    let res = upload(&server, &other, &recipe, image_form(PNG, "photo.png")).await;
    assert_eq!(res.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn deleting_recipe_removes_its_image() {
    let server = TestServer::start().await;
    let auth = server.user("chef@example.com").await;
    let recipe = server.recipe(&auth, json!({})).await;

    let body: Value = upload(&server, &auth, &recipe, image_form(PNG, "photo.png"))
        .await
        .json()
        .await
        .unwrap();
    let relative = body["image"]
        .as_str()
        .unwrap()
        .trim_start_matches("/media/")
        .to_string();
    assert!(server.media_root.path().join(&relative).exists());

    let res = server
        .delete(&auth, &format!("/api/recipe/recipes/{}", recipe["id"]))
        .await;
    assert_eq!(res.status(), 204);
    assert!(!server.media_root.path().join(&relative).exists());

    server.shutdown().await;
}
