use fc_core::{Error, FeedbackRating, NewArticle, NewFeedback, NewUser, RecordId};
use fc_inference::HeuristicAnalyzer;
use fc_service::Services;
use fc_storage::{InMemoryStorage, SQLiteStorage};
use std::sync::Arc;
use std::time::Duration;

async fn predicted_article(services: &Services, title: &str) -> RecordId {
    let article = services
        .articles
        .submit_article(NewArticle::new(title, "Body text").with_reliability(0.9))
        .await
        .unwrap();
    let (prediction, _) = services
        .predictions
        .get_or_create_prediction(&article.id.to_string())
        .await
        .unwrap();
    prediction.id
}

fn memory_services() -> Services {
    Services::new(Arc::new(InMemoryStorage::new()), Arc::new(HeuristicAnalyzer))
}

#[tokio::test]
async fn test_submit_feedback() {
    let services = memory_services();
    let user = services
        .users
        .register_user(NewUser { name: "Ada".to_string(), email: "ada@example.com".to_string() })
        .await
        .unwrap();
    let prediction_id = predicted_article(&services, "Budget passes").await;

    let feedback = services
        .feedback
        .submit_feedback(
            NewFeedback::new(prediction_id, FeedbackRating::Helpful)
                .with_comment("  Matches the council minutes. ")
                .from_user(user.id),
        )
        .await
        .unwrap();
    assert_eq!(feedback.prediction_id, prediction_id);
    assert_eq!(feedback.comment.as_deref(), Some("Matches the council minutes."));
    assert_eq!(feedback.user_id, Some(user.id));

    let listed = services
        .feedback
        .feedback_for_prediction(&prediction_id.to_string())
        .await
        .unwrap();
    assert_eq!(listed, vec![feedback]);
}

#[tokio::test]
async fn test_feedback_rejections() {
    let services = memory_services();
    let prediction_id = predicted_article(&services, "Budget passes").await;

    let err = services
        .feedback
        .submit_feedback(NewFeedback::new(RecordId::new(), FeedbackRating::Helpful))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Prediction not found");

    let err = services
        .feedback
        .submit_feedback(NewFeedback::new(prediction_id, FeedbackRating::Helpful).from_user(RecordId::new()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User not found");

    let err = services
        .feedback
        .submit_feedback(NewFeedback::new(prediction_id, FeedbackRating::NotHelpful).with_comment("x".repeat(5000)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    for bad in ["garbage".to_string(), RecordId::new().to_string()] {
        assert!(matches!(
            services.feedback.feedback_for_prediction(&bad).await,
            Err(Error::NotFound(_))
        ));
    }
    assert!(services
        .feedback
        .feedback_for_prediction(&prediction_id.to_string())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_community_posts_carry_tallies() {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        SQLiteStorage::new_with_path(&temp_dir.path().join("community.db"))
            .await
            .unwrap(),
    );
    let services = Services::new(storage, Arc::new(HeuristicAnalyzer));

    let quiet = predicted_article(&services, "Quiet story").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let discussed = predicted_article(&services, "Discussed story").await;

    for (rating, comment) in [
        (FeedbackRating::Helpful, None),
        (FeedbackRating::Helpful, Some("Good summary")),
        (FeedbackRating::NotHelpful, Some("Ignores the correction")),
    ] {
        let mut feedback = NewFeedback::new(discussed, rating);
        feedback.comment = comment.map(str::to_string);
        services.feedback.submit_feedback(feedback).await.unwrap();
    }

    let posts = services.feedback.community_posts().await.unwrap();
    assert_eq!(
        posts.iter().map(|p| p.prediction.prediction.id).collect::<Vec<_>>(),
        vec![discussed, quiet]
    );

    let busy = &posts[0];
    assert_eq!(busy.tally.helpful, 2);
    assert_eq!(busy.tally.not_helpful, 1);
    assert_eq!(
        busy.comments.iter().filter_map(|f| f.comment.as_deref()).collect::<Vec<_>>(),
        vec!["Good summary", "Ignores the correction"]
    );
    assert_eq!(
        busy.prediction.article.as_ref().unwrap().article.title,
        "Discussed story"
    );

    let idle = &posts[1];
    assert_eq!((idle.tally.helpful, idle.tally.not_helpful), (0, 0));
    assert!(idle.comments.is_empty());
}
