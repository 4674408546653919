// All prompt templates for the course pipeline.
// Placeholders in `{braces}` are filled with `str::replace` before sending.

/// Outline prompt. Replace `{topic}`.
pub const OUTLINE_PROMPT: &str = r#"Create a course outline for: "{topic}"

Generate between 5 and 7 chapters that progress from fundamentals to advanced material:
- The first chapters are basic (fundamentals)
- The middle chapters are intermediate (core concepts and applications)
- The last chapters are advanced (complex topics)

Return JSON with this EXACT schema:
{
  "chapters": [
    {
      "title": "string",
      "level": "basic|intermediate|advanced",
      "objectives": ["objective 1", "objective 2"],
      "keyConcepts": ["concept 1", "concept 2"],
      "estimatedMinutes": 10
    }
  ]
}"#;

/// Corrective outline prompt. Replace `{topic}` and `{problem}`.
pub const OUTLINE_CORRECTION_PROMPT: &str = r#"Create a course outline for: "{topic}"

{problem} The outline MUST contain between 5 and 7 chapters. Do not return fewer than 5.

Return JSON with this EXACT schema:
{
  "chapters": [
    {
      "title": "string",
      "level": "basic|intermediate|advanced",
      "objectives": ["objective 1", "objective 2"],
      "keyConcepts": ["concept 1", "concept 2"],
      "estimatedMinutes": 10
    }
  ]
}"#;

/// Chapter prompt. Replace `{topic}`, `{title}`, `{level}`, `{objectives}`, `{concepts}`.
pub const CHAPTER_PROMPT: &str = r#"Write a chapter for a course on "{topic}".

Chapter: {title}
Level: {level}
Learning objectives: {objectives}
Key concepts: {concepts}

Requirements (400-600 words):
1. Introduction (1-2 paragraphs)
2. Key concepts, with 1-2 short code examples if the topic is technical
3. One comparison table if relevant
4. Summary

Use markdown. Do not repeat the chapter title as a heading."#;

/// Replace `{topic}`.
pub const FLASHCARDS_PROMPT: &str = r#"Generate 10 flashcards for: {topic}

Cover key definitions, important facts and common misconceptions.
Return a JSON array: [{"question": "string", "answer": "string"}]"#;

/// Replace `{topic}`.
pub const MCQS_PROMPT: &str = r#"Generate 10 multiple-choice questions for: {topic}

Each question has exactly four options and one correct option.
Return a JSON array: [{"question": "string", "options": ["A", "B", "C", "D"], "correct": "the correct option text", "explanation": "string"}]"#;

/// Replace `{topic}`.
pub const WORD_GAME_PROMPT: &str = r#"Generate 15 vocabulary words for: {topic}

For each word give its correct definition and three plausible but wrong definitions.
Return a JSON array: [{"word": "string", "correct": "string", "incorrect": ["string", "string", "string"]}]"#;

/// Replace `{topic}`.
pub const DEEP_DIVE_PROMPT: &str =
    "Write an 800-1000 word deep-dive article on: {topic}. Use markdown headings and concrete examples.";

/// Replace `{topic}`.
pub const TAKEAWAYS_PROMPT: &str =
    "Summarize the key takeaways for: {topic} in 5-7 markdown bullet points.";

/// Replace `{topic}`.
pub const FAQ_PROMPT: &str = r#"Generate 8-10 frequently asked questions with answers about: {topic}

Return a JSON array: [{"question": "string", "answer": "string"}]"#;

/// Replace `{topic}` and `{chapters}`.
pub const SHORT_SCRIPT_PROMPT: &str = "Write a 5-minute conversational podcast script introducing: {topic}. \
    Touch on these chapters: {chapters}. About 700 words. No speaker labels, no stage directions.";

/// Replace `{topic}` and `{chapters}`.
pub const LONG_SCRIPT_PROMPT: &str = "Write a 20-minute educational lecture script on: {topic}. \
    Walk through these chapters in order: {chapters}. About 3000 words. No speaker labels, no stage directions.";

/// Replace `{topic}`.
pub const SUGGESTIONS_PROMPT: &str = r#"Suggest 5 related topics to study after learning {topic}.

Return a JSON array ordered from most to least relevant: [{"topic": "string", "description": "string"}]"#;

/// Replace `{topic}`.
pub const RESOURCE_QUERY: &str = "{topic} tutorial documentation";
