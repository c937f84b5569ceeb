#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use palaver::ai::{CONNECTION_APOLOGY, GeminiClient};
    use palaver::model::ModelArtifact;
    use palaver::server::handlers::{route_reply, ReplySource};
    use palaver::server::{load_state, AppState, ServerConfig};
    use palaver::trainer::train_dir;
    use tempfile::TempDir;

    const ORDER_REPLY: &str = "Your order is on its way!";
    const REFUND_REPLY: &str = "Refunds are processed within 5 business days.";

    fn write_dataset(dir: &Path) {
        fs::write(
            dir.join("orders.csv"),
            "query,response\n\
             where is my order,Your order is on its way!\n\
             track my order,Your order is on its way!\n\
             has my order shipped yet,Your order is on its way!\n\
             when will my order arrive,Your order is on its way!\n\
             order status please,Your order is on its way!\n",
        )
        .unwrap();
        fs::write(
            dir.join("refunds.csv"),
            "query,response\n\
             i want a refund,Refunds are processed within 5 business days.\n\
             refund my money,Refunds are processed within 5 business days.\n\
             how do i get a refund,Refunds are processed within 5 business days.\n\
             can i return this item,Refunds are processed within 5 business days.\n\
             please refund my purchase,Refunds are processed within 5 business days.\n",
        )
        .unwrap();
    }

    fn state_with(model: Option<ModelArtifact>, dir: &Path) -> AppState {
        AppState {
            model,
            ai: GeminiClient::new(None),
            uploads_dir: dir.join("uploads"),
        }
    }

    #[tokio::test]
    async fn test_train_then_answer_from_dataset() {
        // 1. Write a small two-intent dataset
        let temp_dir = TempDir::new().unwrap();
        write_dataset(temp_dir.path());

        // 2. Train an artifact from it
        let artifact_path = temp_dir.path().join("chatbot_model.bin");
        let report = train_dir(temp_dir.path(), &artifact_path).unwrap();
        assert_eq!(report.examples, 10);
        let mut labels = report.labels.clone();
        labels.sort();
        assert_eq!(labels, ["order_status", "refund_request"]);
        assert!(artifact_path.exists(), "artifact should be written to disk");

        // 3. Load it back the way the server does
        let artifact = ModelArtifact::load(&artifact_path).unwrap();
        let state = state_with(Some(artifact), temp_dir.path());

        // 4. Messages near the training data get the canned responses
        let reply = route_reply(&state, "Where is my order").await.unwrap();
        assert_eq!(reply.source, ReplySource::Dataset);
        assert_eq!(reply.text, ORDER_REPLY);
        assert_eq!(reply.intent.as_deref(), Some("order_status"));
        assert!(reply.confidence.unwrap() > 0.5);

        let reply = route_reply(&state, "I want a refund").await.unwrap();
        assert_eq!(reply.source, ReplySource::Dataset);
        assert_eq!(reply.text, REFUND_REPLY);
        assert_eq!(reply.intent.as_deref(), Some("refund_request"));
    }

    #[tokio::test]
    async fn test_missing_artifact_falls_back_to_ai() {
        // 1. Point the server at a model file that does not exist
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            model_path: temp_dir.path().join("no_such_model.bin"),
            uploads_dir: temp_dir.path().join("uploads"),
        };

        // 2. Startup degrades instead of failing
        let state = load_state(&config);
        assert!(state.model.is_none());

        // 3. Every message routes to the AI side; without a key the client
        //    answers with the canned apology instead of erroring
        let state = state_with(None, temp_dir.path());
        let reply = route_reply(&state, "where is my order").await.unwrap();
        assert_eq!(reply.source, ReplySource::Ai);
        assert_eq!(reply.text, CONNECTION_APOLOGY);
        assert_eq!(reply.intent, None);
        assert_eq!(reply.confidence, None);
    }

    #[tokio::test]
    async fn test_artifact_survives_reload_with_same_predictions() {
        // 1. Train an artifact
        let temp_dir = TempDir::new().unwrap();
        write_dataset(temp_dir.path());
        let artifact_path = temp_dir.path().join("chatbot_model.bin");
        train_dir(temp_dir.path(), &artifact_path).unwrap();

        // 2. Load it twice
        let first = ModelArtifact::load(&artifact_path).unwrap();
        let second = ModelArtifact::load(&artifact_path).unwrap();

        // 3. Both copies classify a held-out phrasing the same way
        let a = first.pipeline.predict("wheres my order at").unwrap();
        let b = second.pipeline.predict("wheres my order at").unwrap();
        assert_eq!(a.intent, b.intent);
        assert_eq!(a.confidence, b.confidence);
    }
}
