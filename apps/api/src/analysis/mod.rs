// Resume analysis: upload → extract → three chained LLM calls → one reply.
// All LLM calls go through the TextGenerator trait; no direct Gemini calls here.

pub mod handlers;
pub mod match_score;
pub mod pipeline;
pub mod prompts;
