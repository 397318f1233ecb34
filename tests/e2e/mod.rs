// Postgres integration tests for the narration and session stores.
//
// One shared PostgreSQL container (testcontainers) serves the whole suite;
// every test leases its own migrated database from a pool, so tests can run
// in parallel. They need Docker and are ignored by default:
//
//     cargo test --test e2e_tests -- --ignored

mod helpers;
mod test_pg_narration;
mod test_pg_sessions;
