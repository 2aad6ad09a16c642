//! Basic example of the Injecta container.

use std::sync::Arc;

use injecta::Injectable;
use injecta::prelude::*;
use tracing::info;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
#[injectable(implements(Logger))]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Injectable)]
struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Injectable)]
struct UserRepository {
    db: Arc<Database>,
}

#[derive(Injectable)]
#[injectable(extend = user_service_methods)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: i64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo
            .db
            .query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

fn user_service_methods(class: ClassDescriptor) -> ClassDescriptor {
    class.method("get_user", [ParamSpec::new("id")], |this: &UserService, args| {
        Ok(this.get_user(args.take("id")?))
    })
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("injecta_container=debug")
        .init();

    // Every #[derive(Injectable)] type is known; bindings fill in the rest
    let mut container = Container::discover();
    container
        .set_mapping("Logger", "ConsoleLogger")
        .get_constructor("Database")
        .set_param("url", "postgres://localhost/myapp");

    info!("{container:?}");

    // Wires UserRepository, Database and the mapped Logger on demand
    let service = container.make_as::<UserService>("UserService")?;
    println!("{}", service.get_user(42));

    // Resolved again: the same singleton
    let again = container.make_as::<UserService>("UserService")?;
    println!("Same instance: {}", Arc::ptr_eq(&service, &again));

    // Methods can be invoked through the container too
    let service = container.make("UserService")?;
    let result = container.invoke_with((&service, "get_user"), params! { "id" => 7 })?;
    println!("{}", result.as_str().unwrap_or_default());

    // A second, non-shared database
    container.singleton("Database#replica", false);
    container
        .get_constructor("Database#replica")
        .set_param("url", "postgres://replica/myapp");
    let replica = container.make_as::<Database>("Database#replica")?;
    println!("{}", replica.query("SELECT 1"));

    Ok(())
}
