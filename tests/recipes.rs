mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, body_string, recipe_payload, TestApp, TestUser};
use serde_json::json;

struct Kitchen {
    app: TestApp,
    chef: TestUser,
    lunch: i64,
    dinner: i64,
    flour: i64,
    sugar: i64,
    eggs: i64,
}

async fn kitchen() -> Kitchen {
    let app = TestApp::new().await;
    let chef = app.signed_in("chef").await;
    let lunch = app.seed_tag("Lunch", "lunch").await;
    let dinner = app.seed_tag("Dinner", "dinner").await;
    let flour = app.seed_ingredient("flour", "g").await;
    let sugar = app.seed_ingredient("sugar", "g").await;
    let eggs = app.seed_ingredient("eggs", "pcs").await;
    Kitchen {
        app,
        chef,
        lunch,
        dinner,
        flour,
        sugar,
        eggs,
    }
}

#[tokio::test]
async fn create_recipe_returns_read_shape() {
    let k = kitchen().await;

    let payload = recipe_payload("Pancakes", &[k.lunch], &[(k.flour, 200), (k.eggs, 2)]);
    let resp = k.app.post_json("/api/recipes/", payload, Some(&k.chef.cookie)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["cooking_time"], 30);
    assert_eq!(body["author"]["id"], k.chef.id);
    assert_eq!(body["tags"][0]["slug"], "lunch");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["is_favorited"], false);
    assert_eq!(body["is_in_shopping_cart"], false);

    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("/media/recipes/images/"));
    assert!(image.ends_with(".png"));
    let stored = k.app.media.path().join(image.trim_start_matches("/media/"));
    assert!(stored.exists());

    let resp = k.app.get(image, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn amount_as_numeric_string_accepted() {
    let k = kitchen().await;

    let mut payload = recipe_payload("Cake", &[k.lunch], &[]);
    payload["ingredients"] = json!([{"id": k.flour, "amount": "250"}]);
    payload["cooking_time"] = json!("45");
    let id = k.app.create_recipe(&k.chef.cookie, payload).await;

    let body = body_json(k.app.get(&format!("/api/recipes/{id}/"), None).await).await;
    assert_eq!(body["ingredients"][0]["amount"], 250);
    assert_eq!(body["cooking_time"], 45);
}

#[tokio::test]
async fn duplicate_ingredients_rejected_without_writes() {
    let k = kitchen().await;

    let payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, 100), (k.flour, 50)]);
    let resp = k.app.post_json("/api/recipes/", payload, Some(&k.chef.cookie)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "unique_ingredients").await;

    assert_eq!(k.app.count("recipes").await, 0);
    assert_eq!(k.app.count("recipe_ingredients").await, 0);
    assert_eq!(k.app.count("recipe_tags").await, 0);
}

#[tokio::test]
async fn zero_amount_rejected() {
    let k = kitchen().await;

    let payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, 0)]);
    let resp = k.app.post_json("/api/recipes/", payload, Some(&k.chef.cookie)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_amount").await;
    assert_eq!(k.app.count("recipes").await, 0);
}

#[tokio::test]
async fn amount_above_smallint_range_rejected() {
    let k = kitchen().await;

    for amount in [32_768, i64::MAX] {
        let payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, amount)]);
        let resp = k.app.post_json("/api/recipes/", payload, Some(&k.chef.cookie)).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "invalid_amount").await;
    }
    assert_eq!(k.app.count("recipes").await, 0);

    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 32_767)]))
        .await;
    let body = body_json(k.app.get(&format!("/api/recipes/{id}/"), None).await).await;
    assert_eq!(body["ingredients"][0]["amount"], 32_767);
}

#[tokio::test]
async fn non_integer_amount_is_invalid_amount() {
    let k = kitchen().await;
    let cookie = Some(k.chef.cookie.as_str());

    for line in [
        json!({"id": k.flour, "amount": 1.5}),
        json!({"id": k.flour, "amount": true}),
        json!({"id": k.flour}),
    ] {
        let mut payload = recipe_payload("Cake", &[k.lunch], &[]);
        payload["ingredients"] = json!([line]);
        let resp = k.app.post_json("/api/recipes/", payload, cookie).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "invalid_amount");
        assert_eq!(body["field"], "ingredients");
    }
    assert_eq!(k.app.count("recipes").await, 0);
}

#[tokio::test]
async fn malformed_payload_gets_json_error() {
    let k = kitchen().await;
    let cookie = Some(k.chef.cookie.as_str());

    let mut payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]);
    payload["tags"] = json!(["lunch"]);
    let resp = k.app.post_json("/api/recipes/", payload, cookie).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "invalid_payload");
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

    let resp = k.app.post_json("/api/recipes/", json!([1, 2, 3]), cookie).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_payload").await;
    assert_eq!(k.app.count("recipes").await, 0);
}

#[tokio::test]
async fn ingredient_and_tag_rules() {
    let k = kitchen().await;
    let cookie = Some(k.chef.cookie.as_str());

    let cases = [
        (recipe_payload("A", &[k.lunch], &[]), "no_ingredients"),
        (recipe_payload("A", &[k.lunch], &[(999, 1)]), "ingredients_doesnt_exist"),
        (recipe_payload("A", &[], &[(k.flour, 1)]), "no_tags"),
        (recipe_payload("A", &[999], &[(k.flour, 1)]), "tags_doesnt_exist"),
        (recipe_payload("A", &[k.lunch, k.lunch], &[(k.flour, 1)]), "unique_tags"),
    ];
    for (payload, code) in cases {
        let resp = k.app.post_json("/api/recipes/", payload, cookie).await;
        assert_error(resp, StatusCode::BAD_REQUEST, code).await;
    }
    assert_eq!(k.app.count("recipes").await, 0);
}

#[tokio::test]
async fn field_rules() {
    let k = kitchen().await;
    let cookie = Some(k.chef.cookie.as_str());
    let valid = recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]);

    let mut no_image = valid.clone();
    no_image.as_object_mut().unwrap().remove("image");
    let mut bad_image = valid.clone();
    bad_image["image"] = json!("data:image/png;base64,bm90IGFuIGltYWdl");
    let mut zero_time = valid.clone();
    zero_time["cooking_time"] = json!(0);
    let mut blank_name = valid.clone();
    blank_name["name"] = json!("   ");
    let mut long_name = valid.clone();
    long_name["name"] = json!("x".repeat(201));

    let cases = [
        (no_image, "no_image"),
        (bad_image, "invalid_image"),
        (zero_time, "invalid_cooking_time"),
        (blank_name, "invalid_name"),
        (long_name, "invalid_name"),
    ];
    for (payload, code) in cases {
        let resp = k.app.post_json("/api/recipes/", payload, cookie).await;
        assert_error(resp, StatusCode::BAD_REQUEST, code).await;
    }
    assert_eq!(k.app.count("recipes").await, 0);
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
    let k = kitchen().await;
    let payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]);
    let resp = k.app.post_json("/api/recipes/", payload, None).await;
    assert_error(resp, StatusCode::UNAUTHORIZED, "not_authenticated").await;
}

#[tokio::test]
async fn update_replaces_ingredient_set() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(
            &k.chef.cookie,
            recipe_payload("Cake", &[k.lunch], &[(k.flour, 200), (k.sugar, 50)]),
        )
        .await;

    let mut payload = recipe_payload("Better cake", &[k.dinner], &[(k.eggs, 3)]);
    payload.as_object_mut().unwrap().remove("image");
    let resp = k
        .app
        .patch_json(&format!("/api/recipes/{id}/"), payload, Some(&k.chef.cookie))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["name"], "Better cake");
    let ingredients = body["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["id"], k.eggs);
    assert_eq!(ingredients[0]["amount"], 3);
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["id"], k.dinner);
    assert_eq!(k.app.count("recipe_ingredients").await, 1);
}

#[tokio::test]
async fn update_with_new_image_replaces_file() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]))
        .await;
    let before = body_json(k.app.get(&format!("/api/recipes/{id}/"), None).await).await;
    let old_image = before["image"].as_str().unwrap().trim_start_matches("/media/").to_string();

    let payload = recipe_payload("Cake", &[k.lunch], &[(k.flour, 2)]);
    let body = body_json(
        k.app
            .patch_json(&format!("/api/recipes/{id}/"), payload, Some(&k.chef.cookie))
            .await,
    )
    .await;
    let new_image = body["image"].as_str().unwrap().trim_start_matches("/media/").to_string();

    assert_ne!(old_image, new_image);
    assert!(!k.app.media.path().join(&old_image).exists());
    assert!(k.app.media.path().join(&new_image).exists());
}

#[tokio::test]
async fn invalid_update_keeps_previous_sets() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 200)]))
        .await;

    let mut payload = recipe_payload("Cake", &[k.lunch], &[(k.sugar, 1), (k.sugar, 2)]);
    payload.as_object_mut().unwrap().remove("image");
    let resp = k
        .app
        .patch_json(&format!("/api/recipes/{id}/"), payload, Some(&k.chef.cookie))
        .await;
    assert_error(resp, StatusCode::BAD_REQUEST, "unique_ingredients").await;

    let body = body_json(k.app.get(&format!("/api/recipes/{id}/"), None).await).await;
    assert_eq!(body["ingredients"][0]["id"], k.flour);
    assert_eq!(body["ingredients"][0]["amount"], 200);
}

#[tokio::test]
async fn failed_update_rolls_back_every_change() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 200)]))
        .await;

    sqlx::query(
        "CREATE TRIGGER block_ingredients BEFORE INSERT ON recipe_ingredients \
         BEGIN SELECT RAISE(ABORT, 'blocked'); END",
    )
    .execute(&k.app.db)
    .await
    .unwrap();

    let mut payload = recipe_payload("Renamed", &[k.dinner], &[(k.eggs, 3)]);
    payload.as_object_mut().unwrap().remove("image");
    let resp = k
        .app
        .patch_json(&format!("/api/recipes/{id}/"), payload, Some(&k.chef.cookie))
        .await;
    assert_error(resp, StatusCode::INTERNAL_SERVER_ERROR, "internal_error").await;

    let body = body_json(k.app.get(&format!("/api/recipes/{id}/"), None).await).await;
    assert_eq!(body["name"], "Cake");
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["id"], k.lunch);
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["ingredients"][0]["id"], k.flour);
    assert_eq!(body["ingredients"][0]["amount"], 200);
    assert_eq!(k.app.count("recipe_tags").await, 1);
    assert_eq!(k.app.count("recipe_ingredients").await, 1);
}

#[tokio::test]
async fn update_without_tags_rejected() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]))
        .await;

    let resp = k
        .app
        .patch_json(
            &format!("/api/recipes/{id}/"),
            json!({"name": "Cake", "text": "Bake.", "cooking_time": 10, "ingredients": [{"id": k.flour, "amount": 1}]}),
            Some(&k.chef.cookie),
        )
        .await;
    assert_error(resp, StatusCode::BAD_REQUEST, "no_tags").await;
    assert_eq!(k.app.count("recipe_tags").await, 1);
}

#[tokio::test]
async fn only_author_may_change_recipe() {
    let k = kitchen().await;
    let other = k.app.signed_in("intruder").await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]))
        .await;

    let resp = k
        .app
        .patch_json(
            &format!("/api/recipes/{id}/"),
            recipe_payload("Mine now", &[k.lunch], &[(k.flour, 1)]),
            Some(&other.cookie),
        )
        .await;
    assert_error(resp, StatusCode::FORBIDDEN, "permission_denied").await;

    let resp = k.app.delete(&format!("/api/recipes/{id}/"), Some(&other.cookie)).await;
    assert_error(resp, StatusCode::FORBIDDEN, "permission_denied").await;
    assert_eq!(k.app.count("recipes").await, 1);
}

#[tokio::test]
async fn delete_recipe_cascades() {
    let k = kitchen().await;
    let id = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Cake", &[k.lunch], &[(k.flour, 1)]))
        .await;
    k.app
        .post_json(&format!("/api/recipes/{id}/favorite/"), json!({}), Some(&k.chef.cookie))
        .await;
    k.app
        .post_json(&format!("/api/recipes/{id}/shopping_cart/"), json!({}), Some(&k.chef.cookie))
        .await;

    let resp = k.app.delete(&format!("/api/recipes/{id}/"), Some(&k.chef.cookie)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = k.app.get(&format!("/api/recipes/{id}/"), None).await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
    for table in ["recipe_tags", "recipe_ingredients", "favorites", "cart_items"] {
        assert_eq!(k.app.count(table).await, 0, "{table} should be empty");
    }
}

#[tokio::test]
async fn list_is_newest_first_and_paginated() {
    let k = kitchen().await;
    for name in ["First", "Second", "Third"] {
        k.app
            .create_recipe(&k.chef.cookie, recipe_payload(name, &[k.lunch], &[(k.flour, 1)]))
            .await;
    }

    let body = body_json(k.app.get("/api/recipes/?limit=2", None).await).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["name"], "Third");
    assert_eq!(body["results"][1]["name"], "Second");
    assert_eq!(body["next"], "http://testserver/api/recipes/?limit=2&page=2");

    let body = body_json(k.app.get("/api/recipes/?limit=2&page=2", None).await).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["name"], "First");
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], "http://testserver/api/recipes/?limit=2");
}

#[tokio::test]
async fn list_filters_by_tags_and_author() {
    let k = kitchen().await;
    let other = k.app.signed_in("other").await;
    k.app
        .create_recipe(&k.chef.cookie, recipe_payload("Soup", &[k.lunch], &[(k.flour, 1)]))
        .await;
    k.app
        .create_recipe(&k.chef.cookie, recipe_payload("Steak", &[k.dinner], &[(k.flour, 1)]))
        .await;
    k.app
        .create_recipe(&other.cookie, recipe_payload("Salad", &[k.lunch, k.dinner], &[(k.flour, 1)]))
        .await;

    let body = body_json(k.app.get("/api/recipes/?tags=lunch", None).await).await;
    assert_eq!(body["count"], 2);

    let body = body_json(k.app.get("/api/recipes/?tags=lunch&tags=dinner", None).await).await;
    assert_eq!(body["count"], 3);

    let uri = format!("/api/recipes/?author={}&tags=dinner", k.chef.id);
    let body = body_json(k.app.get(&uri, None).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Steak");
}

#[tokio::test]
async fn viewer_filters() {
    let k = kitchen().await;
    let soup = k
        .app
        .create_recipe(&k.chef.cookie, recipe_payload("Soup", &[k.lunch], &[(k.flour, 1)]))
        .await;
    k.app
        .create_recipe(&k.chef.cookie, recipe_payload("Steak", &[k.dinner], &[(k.flour, 1)]))
        .await;
    k.app
        .post_json(&format!("/api/recipes/{soup}/favorite/"), json!({}), Some(&k.chef.cookie))
        .await;

    let body = body_json(k.app.get("/api/recipes/?is_favorited=1", Some(&k.chef.cookie)).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], soup);
    assert_eq!(body["results"][0]["is_favorited"], true);

    let body = body_json(k.app.get("/api/recipes/?is_favorited=0", Some(&k.chef.cookie)).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Steak");

    let body = body_json(k.app.get("/api/recipes/?is_favorited=1", None).await).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn non_numeric_recipe_id_is_rejected() {
    let k = kitchen().await;
    let resp = k.app.get("/api/recipes/abc/", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!body_string(resp).await.is_empty());
}
