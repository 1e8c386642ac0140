use lms_core::{
    models::{Actor, NewPost},
    AppError,
};

use crate::common::Fixture;

fn post(body: &str) -> NewPost {
    NewPost {
        body: body.into(),
        image: Some("uploads/reading-room.png".into()),
    }
}

#[tokio::test]
async fn test_wall_round_trip() {
    let fx = Fixture::new(1, 3).await;
    let feed = &fx.services.feed;

    let first = feed
        .create_post(&Actor::Student(1), &post("Study group on Friday in room 4"))
        .await
        .unwrap();
    let second = feed
        .create_post(&Actor::Student(2), &post("Anyone has notes for the physics lab?"))
        .await
        .unwrap();

    assert!(feed.toggle_like(&Actor::Student(3), first.id).await.unwrap());
    assert!(feed.toggle_like(&Actor::Student(2), first.id).await.unwrap());
    assert!(!feed.toggle_like(&Actor::Student(3), first.id).await.unwrap());

    feed.add_comment(&Actor::Student(3), first.id, "Count me in!")
        .await
        .unwrap();
    let err = feed
        .add_comment(&Actor::Student(3), first.id, "!!!???")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let posts = feed.list_posts(1, 10).await.unwrap();
    assert_eq!(posts.len(), 2);
    let liked = posts.iter().find(|p| p.id == first.id).unwrap();
    assert_eq!(liked.likes, vec![2]);
    assert_eq!(feed.comments(first.id).await.unwrap().len(), 1);

    feed.delete_post(&Actor::Librarian, second.id).await.unwrap();
    assert_eq!(feed.list_posts(1, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let fx = Fixture::new(1, 1).await;
    let err = fx
        .services
        .feed
        .add_comment(&Actor::Student(1), 999, "Great pick of the week")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
