/// Input for one summarization call.
#[derive(Debug, Clone)]
pub struct SummaryRequest<'a> {
    pub content: &'a str,
    pub url: &'a str,
    pub vertical: &'a str,
}

/// The fixed instruction contract. `tag_vocabulary` is the caller's closed
/// tag list; anything the model invents outside it gets dropped downstream.
pub fn system_prompt(tag_vocabulary: &[&str]) -> String {
    format!(
        r#"You are a research analyst producing briefing entries from source articles.

Respond with a single JSON object and nothing else, with these fields:
- "title": the article's title, or null if none is apparent
- "summary": exactly one sentence summarizing the article
- "bullets": exactly 5 short bullet strings with the key facts
- "why_it_matters": 1-2 sentences on why this matters to the reader, or null
- "tags": an array of tags chosen only from: {tags}
- "entities": an object mapping entity kinds (companies, people, places, ...) to arrays of names
- "relevance_score": an integer from 0 to 100 rating relevance to the vertical
- "visibility": one of "public", "pro", "internal""#,
        tags = tag_vocabulary.join(", ")
    )
}

pub(crate) fn user_prompt(req: &SummaryRequest<'_>) -> String {
    format!(
        "Vertical: {}\nURL: {}\n\nArticle content:\n{}",
        req.vertical, req.url, req.content
    )
}
