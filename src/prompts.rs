//! Fixed prompt templates sent to the language model.

pub fn classification_prompt(query: &str) -> String {
    format!(
        "Classify the user query into one of: 'weather' or 'document-qa'.\n\
         If about current weather, forecasts, temperature, rain, humidity, or a city, choose 'weather'.\n\
         If about a PDF/document content, knowledge, or asking questions unrelated to weather, choose 'document-qa'.\n\
         Return only the single label.\n\n\
         Query: {}",
        query
    )
}

pub fn weather_summary_prompt(weather_json: &serde_json::Value, user_query: &str) -> String {
    format!(
        "You are a helpful assistant. Summarize the current weather clearly and concisely.\n\
         User asked: {}\n\
         Weather JSON:\n{}\n\
         Return a user-friendly, actionable summary in 3-6 sentences, with °C and any alerts.",
        user_query, weather_json
    )
}

pub fn document_answer_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an assistant.\n\
         Go through the context to see what is given, understand and answer the question accordingly.\n\n\
         Question: {}\n\n\
         Context:\n{}\n\n\
         Answer in plain language without mentioning chunks, documents, or sources.\n\
         Be clear, concise, and natural.",
        question, context
    )
}

pub fn compaction_prompt(answer: &str) -> String {
    format!(
        "Summarize the following response into a compact 1-2 sentence nugget for future retrieval:\n\n{}",
        answer
    )
}
