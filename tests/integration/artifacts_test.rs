//! Artifact extraction on aggregated answers.

use streamchat::models::artifact::ArtifactKind;
use streamchat::services::artifacts::{extract_artifact, extract_with_placeholder};
use streamchat::services::streaming::StreamAggregator;
use streamchat_llm::ConversationTurn;
use tokio_util::sync::CancellationToken;

use crate::support::FakeProvider;

#[test]
fn test_html_preferred_over_svg() {
    let answer = "Two options:\n```svg\n<svg><circle r=\"4\"/></svg>\n```\n```html\n<h1>Hi</h1>\n```";
    let artifact = extract_artifact(answer).unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Html);
    assert_eq!(artifact.language, "html");
    assert_eq!(artifact.content, "<h1>Hi</h1>\n");
}

#[test]
fn test_plain_answer_has_no_artifact() {
    assert!(extract_artifact("No code here, just prose.").is_none());
    let extraction = extract_with_placeholder("No code here, just prose.");
    assert!(extraction.artifact.is_none());
    assert_eq!(extraction.display_text, "No code here, just prose.");
}

#[tokio::test]
async fn test_artifact_assembled_from_streamed_fragments() {
    let provider = FakeProvider::new(&[
        ("Here is a component:\n```js", false),
        ("x\nexport default function App() {\n", false),
        ("  return <div/>;\n}\n```\nEnjoy!", false),
    ]);
    let result = StreamAggregator::run(
        &provider,
        &[ConversationTurn::user("make a component")],
        "",
        &CancellationToken::new(),
        |_| {},
    )
    .await
    .unwrap();

    let extraction = extract_with_placeholder(&result.answer_text);
    let artifact = extraction.artifact.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::React);
    assert_eq!(artifact.title, "React Component");
    assert!(artifact.content.starts_with("export default function App()"));
    assert!(extraction.display_text.starts_with("Here is a component:\n\n\n:::artifact{id=\""));
    assert!(extraction.display_text.ends_with("type=\"react\"}\n\n\nEnjoy!"));
    assert!(!extraction.display_text.contains("```"));
}
