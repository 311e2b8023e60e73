//! Example consumer: a `Customer` resource served over HTTP.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! With `CRUDKIT_DATABASE_URL` (or `DATABASE_URL`) set, customers are stored in
//! PostgreSQL; otherwise they live in memory.

use crudkit::{
    common_routes, init_tracing, mount, ClassBuilder, Describe, Identified, MemoryRepository,
    PgDocumentRepository, Repository, Resource, ResourceState, Settings, UuidKeys,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Address {
    street: Option<String>,
    city: Option<String>,
}

impl Describe for Address {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("street", |a| &a.street, |a| &mut a.street).length(80);
        class.scalar("city", |a| &a.city, |a| &mut a.city).not_null();
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Customer {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    address: Option<Address>,
    tags: Option<Vec<String>>,
}

impl Identified for Customer {
    type Id = String;

    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }
}

impl Describe for Customer {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("id", |c| &c.id, |c| &mut c.id).read_only().insertable(false);
        class.scalar("name", |c| &c.name, |c| &mut c.name).not_null().length(120);
        class.scalar("email", |c| &c.email, |c| &mut c.email).length(254);
        class.entity("address", |c| &c.address, |c| &mut c.address);
        class.scalar_collection("tags", |c| &c.tags, |c| &mut c.tags);
    }
}

impl Resource for Customer {
    const NAME: &'static str = "customers";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(&settings);

    let repository: Arc<dyn Repository<Customer>> = match &settings.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            let repository = PgDocumentRepository::<Customer>::new(pool, &settings.schema, Arc::new(UuidKeys))?;
            repository.ensure_table().await?;
            Arc::new(repository)
        }
        None => {
            tracing::warn!("no database configured, customers are kept in memory");
            Arc::new(MemoryRepository::<Customer>::new(Arc::new(UuidKeys)))
        }
    };

    let app = mount(common_routes(), ResourceState::new(repository, &settings));
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
