/// modrepo: Top-level CLI entrypoint for the module catalog pipeline.
///
/// This crate provides the main CLI executable, argument parsing, configuration
/// loading and pipeline invocation for the modrepo system. All long-lived
/// business logic and shared models live in [`modrepo-core`]; this crate is a
/// thin shell focused exclusively on CLI, config, and invocation.
///
/// # Usage
///
/// - Binary crate: provides the CLI executable (`modrepo`).
/// - Entry module: parses commands, loads optional YAML config and env
///   secrets, orchestrates the full or incremental catalog build (see `cli`).
/// - To use the code programmatically (e.g., for integration tests), call
///   [`run`] directly with a constructed [`Cli`].
///
/// # CLI Features
/// - Rebuilds the whole module catalog for a hosting-platform organization,
///   or updates a single repository when `REPO` is set and a catalog exists.
/// - Reads `GRAPHQL_TOKEN` from the environment and exits non-zero before any
///   network I/O when it is missing.
///
/// # Dependency Structure
/// - All actual business logic (validation, assembly, persistence, platform
///   clients) lives in [modrepo-core].
/// - This crate should only handle CLI argument parsing, one-time setup,
///   tracing and orchestration.
/// - Consider extending core functionality in `modrepo-core` before expanding
///   CLI code here.
///
/// # Example
/// ```sh
/// modrepo sync --config modrepo.yaml
/// ```
///
/// For the configuration schema, see the `load_config` module documentation.
pub mod cli;
pub mod load_config;
pub use cli::{run, Cli, Commands};
