pub mod openai2gemini;
