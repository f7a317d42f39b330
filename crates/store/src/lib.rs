pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{ItemId, ItemKind, Money, OrderId, OrderStatus, ProductId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTx};
pub use model::{DrinkLine, IngredientLine, Item, OrderRecord, Product, ProductLine};
pub use postgres::{PostgresStore, PostgresTx};
pub use query::{ItemQuery, OrderQuery, ProductQuery};
pub use store::{RowLock, Store, StoreTx};
