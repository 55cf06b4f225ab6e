//! End-to-end scenarios (§8): priority ordering, dedup + fan-out, and soft-TTL refresh
//! exercised through the full `Volley` facade (queue + dispatchers + cache + delivery).
