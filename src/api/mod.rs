/*
 * Responsibility
 * - handler / extractor の公開ポイント
 */
pub mod extractors;
pub mod handlers;
