//! Route-level tests: each demo route driven through `Route::handle`.
//!
//! Run with: cargo test --package relmap-demo --test routes

use serde_json::Value;

use relmap_core::StoreConfig;
use relmap_demo::config::DemoConfig;
use relmap_demo::routes::{Route, TodoRoute};
use relmap_demo::views::{Body, Flash, Response};
use relmap_store::Store;

fn json(response: &Response) -> Value {
    match &response.body {
        Body::Json(value) => value.clone(),
        other => panic!("expected a json body, got {other:?}"),
    }
}

fn flash(response: &Response) -> Option<Flash> {
    match &response.body {
        Body::Redirect { location, flash } => {
            assert_eq!(location, "/");
            flash.clone()
        }
        other => panic!("expected a redirect, got {other:?}"),
    }
}

fn todo(route: TodoRoute, store: &Store) -> Response {
    Route::Todo(route).handle(store)
}

#[test]
fn test_index_and_books() {
    let store = Store::in_memory();
    assert_eq!(
        Route::Index.handle(&store).render(),
        r#"{"message":"Hello, World!"}"#
    );
    assert_eq!(Route::Books.handle(&store).render(), "books");
}

#[test]
fn test_user_add_then_users() {
    let store = Store::in_memory();
    let added = Route::UserAdd.handle(&store);
    assert_eq!(added.status, 200);
    assert_eq!(json(&added)["message"], "User and Profile added successfully!");

    let users = json(&Route::Users.handle(&store));
    let users = users["message"].as_array().unwrap();
    assert_eq!(users.len(), 1);

    let user = &users[0];
    assert_eq!(user["id"], 1);
    assert_eq!(user["name"], "John Doe");
    assert_eq!(user["profile_bio"], "Software Developer");
    assert_eq!(user["posts"].as_array().unwrap().len(), 0);
    let roles: Vec<&str> = user["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["Admin", "Editor", "Viewer"]);
}

#[test]
fn test_post_add_then_posts_and_users() {
    let store = Store::in_memory();
    assert_eq!(
        json(&Route::PostAdd.handle(&store))["message"],
        "Posts added successfully!"
    );

    let posts = json(&Route::Posts.handle(&store));
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0]["title"], "First Post");
    assert_eq!(posts[2]["description"], "This is the third post");
    for post in posts {
        assert_eq!(post["author_name"], "John Doe");
    }

    // The user created on the fly has no profile.
    let users = json(&Route::Users.handle(&store));
    assert!(users["message"][0]["profile_bio"].is_null());
    assert_eq!(users["message"][0]["posts"][1]["title"], "Second Post");
}

#[test]
fn test_roles_and_profiles_see_their_users() {
    let store = Store::in_memory();
    Route::UserAdd.handle(&store);

    let roles = json(&Route::Roles.handle(&store));
    let roles = roles.as_array().unwrap();
    assert_eq!(roles.len(), 3);
    for role in roles {
        assert_eq!(role["users"][0]["name"], "John Doe");
    }

    let profiles = json(&Route::Profiles.handle(&store));
    assert_eq!(profiles[0]["bio"], "Software Developer");
    assert_eq!(profiles[0]["user_name"], "John Doe");
}

#[test]
fn test_single_entity_routes() {
    let store = Store::in_memory();
    Route::UserAdd.handle(&store);
    Route::PostAdd.handle(&store);

    let user = json(&Route::User { id: 1 }.handle(&store));
    assert_eq!(user["posts"].as_array().unwrap().len(), 3);

    let post = json(&Route::Post { id: 2 }.handle(&store));
    assert_eq!(post["title"], "Second Post");
    assert_eq!(post["author_name"], "John Doe");

    let role = json(&Route::Role { id: 3 }.handle(&store));
    assert_eq!(role["name"], "Viewer");
}

#[test]
fn test_missing_entities_are_404() {
    let store = Store::in_memory();
    for (route, message) in [
        (Route::User { id: 7 }, "User not found"),
        (Route::Post { id: 7 }, "Post not found"),
        (Route::Role { id: 7 }, "Role not found"),
    ] {
        let response = route.handle(&store);
        assert_eq!(response.status, 404);
        assert_eq!(json(&response)["error"], message);
    }
}

#[test]
fn test_todo_flow() {
    let store = Store::in_memory();

    for title in ["Buy milk", "Write tests"] {
        let added = todo(
            TodoRoute::Add {
                title: Some(title.to_string()),
            },
            &store,
        );
        assert_eq!(added.status, 302);
        assert_eq!(
            flash(&added),
            Some(Flash::success("Todo added successfully!"))
        );
    }

    // Newest first.
    let page = json(&todo(TodoRoute::List, &store));
    assert_eq!(page["todos"][0]["title"], "Write tests");
    assert_eq!(page["todos"][1]["title"], "Buy milk");
    assert!(page["edit_todo"].is_null());

    let edited = todo(
        TodoRoute::Edit {
            id: 1,
            title: Some("Buy oat milk".to_string()),
        },
        &store,
    );
    assert_eq!(
        flash(&edited),
        Some(Flash::success("Todo updated successfully!"))
    );

    let page = json(&todo(TodoRoute::Show { id: 1 }, &store));
    assert_eq!(page["edit_todo"]["title"], "Buy oat milk");

    let deleted = todo(TodoRoute::Delete { id: 1 }, &store);
    assert_eq!(
        flash(&deleted),
        Some(Flash::success("Todo deleted successfully!"))
    );
    let page = json(&todo(TodoRoute::List, &store));
    assert_eq!(page["todos"].as_array().unwrap().len(), 1);
}

#[test]
fn test_missing_todo_redirects_without_flash() {
    let store = Store::in_memory();

    let edited = todo(
        TodoRoute::Edit {
            id: 404,
            title: Some("nothing".to_string()),
        },
        &store,
    );
    assert_eq!(flash(&edited), None);

    let deleted = todo(TodoRoute::Delete { id: 404 }, &store);
    assert_eq!(flash(&deleted), None);

    let page = todo(TodoRoute::Show { id: 404 }, &store);
    assert_eq!(page.status, 200);
    assert!(json(&page)["edit_todo"].is_null());
}

#[test]
fn test_todo_without_title_is_rejected() {
    let store = Store::in_memory();
    let response = todo(TodoRoute::Add { title: None }, &store);
    assert_eq!(response.status, 400);
    assert!(json(&response)["error"].is_string());
    assert_eq!(
        json(&todo(TodoRoute::List, &store))["todos"]
            .as_array()
            .unwrap()
            .len(),
        0
    );
}

#[test]
fn test_routes_persist_to_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let demo = DemoConfig {
        relations_file: dir.path().join("database.db.json"),
        todo_file: dir.path().join("todos.db.json"),
        log_json: false,
    };
    let base = StoreConfig::default();

    let relations = Store::open(&demo.relations_store(&base)).unwrap();
    Route::UserAdd.handle(&relations);
    relations.close().unwrap();

    let todos = Store::open(&demo.todo_store(&base)).unwrap();
    todo(
        TodoRoute::Add {
            title: Some("Persist me".to_string()),
        },
        &todos,
    );
    todos.close().unwrap();

    assert!(demo.relations_file.exists());
    assert!(demo.todo_file.exists());

    let reopened = Store::open(&demo.relations_store(&base)).unwrap();
    let users = json(&Route::Users.handle(&reopened));
    assert_eq!(users["message"][0]["name"], "John Doe");
    let stats = json(&Route::Stats.handle(&reopened));
    assert_eq!(stats["todo"], 0);

    let reopened = Store::open(&demo.todo_store(&base)).unwrap();
    let page = json(&todo(TodoRoute::List, &reopened));
    assert_eq!(page["todos"][0]["title"], "Persist me");
}
