/*
 * Responsibility
 * - 外部サービスとのやり取り (introspection endpoint, upstream API)
 */
pub mod introspection;
pub mod proxy;
