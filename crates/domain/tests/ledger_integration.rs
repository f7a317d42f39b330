//! Integration tests for the catalog, product and order services.
//!
//! These tests drive the services together over one in-memory store and
//! check the cross-entity rules: totals, usage lock-out and atomicity.

use common::{ItemId, ItemKind, Money, OrderStatus, ProductId};
use domain::{
    Catalog, CreateItem, CreateOrder, DomainError, IngredientRequest, ItemUpdate, OrderLedger,
    ProductDraft, ProductService, UpdateOrder, UsageGuard,
};
use store::{InMemoryStore, OrderQuery};

struct Services {
    store: InMemoryStore,
    catalog: Catalog<InMemoryStore>,
    products: ProductService<InMemoryStore>,
    orders: OrderLedger<InMemoryStore>,
    guard: UsageGuard<InMemoryStore>,
}

fn services() -> Services {
    let store = InMemoryStore::new();
    Services {
        catalog: Catalog::new(store.clone()),
        products: ProductService::new(store.clone()),
        orders: OrderLedger::new(store.clone()),
        guard: UsageGuard::new(store.clone()),
        store,
    }
}

fn item(id: i64, kind: &str, cents: i64) -> CreateItem {
    CreateItem {
        id: ItemId::new(id),
        kind: kind.to_string(),
        description: format!("item {id}"),
        price: Money::from_cents(cents),
        extra: false,
    }
}

fn order() -> CreateOrder {
    CreateOrder::new("delivery", "Ana", "Rua A, 10", "11999999999")
}

/// Items 5 and 6 (ingredients), drink 10, and product 1 at 25.90.
async fn seed(s: &Services) {
    s.catalog.create_item(item(5, "INGREDIENT", 200)).await.unwrap();
    s.catalog.create_item(item(6, "INGREDIENT", 800)).await.unwrap();
    s.catalog.create_item(item(10, "DRINK", 500)).await.unwrap();
    s.products
        .create_product(
            ProductId::new(1),
            ProductDraft {
                description: "X-Bacon".to_string(),
                price: Money::from_cents(2590),
                ingredients: vec![IngredientRequest::new(5, 1), IngredientRequest::new(6, 1)],
            },
        )
        .await
        .unwrap();
}

mod pricing {
    use super::*;

    #[tokio::test]
    async fn product_price_is_independent_of_ingredients() {
        let s = services();
        seed(&s).await;

        let view = s.orders.create(order().with_product(1, 1)).await.unwrap();
        assert_eq!(view.order.total, Money::from_cents(2590));
        assert_eq!(view.order.total.to_string(), "25.90");
        assert_eq!(view.order.status, OrderStatus::Started);
    }

    #[tokio::test]
    async fn read_back_matches_created_order() {
        let s = services();
        seed(&s).await;

        let created = s
            .orders
            .create(order().with_product(1, 2).with_drink(10, 1))
            .await
            .unwrap();
        let fetched = s.orders.get(created.order.id).await.unwrap();

        assert_eq!(fetched.order.customer_name, "Ana");
        assert_eq!(fetched.order.address, "Rua A, 10");
        assert_eq!(fetched.order.phone, "11999999999");
        assert_eq!(fetched.order.status, OrderStatus::Started);
        assert_eq!(fetched.order.total, Money::from_cents(2 * 2590 + 500));
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn catalog_price_change_applies_only_when_order_is_saved_again() {
        let s = services();
        seed(&s).await;
        let created = s
            .orders
            .create(order().with_product(1, 1).with_drink(10, 1))
            .await
            .unwrap();
        s.orders
            .update(created.order.id, UpdateOrder::new().status(OrderStatus::Finalized))
            .await
            .unwrap();

        s.catalog
            .update_item(
                ItemId::new(10),
                ItemUpdate {
                    description: "Refrigerante".to_string(),
                    price: Money::from_cents(700),
                    extra: false,
                },
            )
            .await
            .unwrap();

        let untouched = s.orders.get(created.order.id).await.unwrap();
        assert_eq!(untouched.order.total, Money::from_cents(2590 + 500));

        let resaved = s
            .orders
            .update(created.order.id, UpdateOrder::new().notes("resaved"))
            .await
            .unwrap();
        assert_eq!(resaved.order.total, Money::from_cents(2590 + 700));
    }

    async fn add_expensive_product(s: &Services) {
        s.products
            .create_product(
                ProductId::new(2),
                ProductDraft {
                    description: "Banquete".to_string(),
                    price: Money::from_cents(i64::MAX / 2 + 1),
                    ingredients: vec![IngredientRequest::new(5, 1)],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn total_overflow_is_rejected_and_nothing_is_stored() {
        let s = services();
        seed(&s).await;
        add_expensive_product(&s).await;

        let result = s.orders.create(order().with_product(2, 2)).await;
        assert!(matches!(result, Err(DomainError::Invalid(ref m)) if m.contains("out of range")));

        let result = s
            .orders
            .create(order().with_product(1, 1).with_drink(10, 2).with_product(2, 2))
            .await;
        assert!(matches!(result, Err(DomainError::Invalid(_))));

        assert!(s.orders.list(OrderQuery::all()).await.unwrap().is_empty());
        assert_eq!(s.store.order_line_count().await, 0);
    }

    #[tokio::test]
    async fn total_overflow_on_update_keeps_stored_order() {
        let s = services();
        seed(&s).await;
        add_expensive_product(&s).await;
        let created = s.orders.create(order().with_product(2, 1)).await.unwrap();

        let result = s
            .orders
            .update(created.order.id, UpdateOrder::new().with_product(2, 3))
            .await;
        assert!(matches!(result, Err(DomainError::Invalid(_))));

        let stored = s.orders.get(created.order.id).await.unwrap();
        assert_eq!(stored, created);
        assert_eq!(stored.order.total, Money::from_cents(i64::MAX / 2 + 1));
    }
}

mod usage_guard {
    use super::*;

    #[tokio::test]
    async fn product_delete_blocked_until_order_finalized() {
        let s = services();
        seed(&s).await;
        let created = s.orders.create(order().with_product(1, 1)).await.unwrap();

        let result = s.products.delete_product(ProductId::new(1)).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert!(s.products.get_product(ProductId::new(1)).await.is_ok());

        s.orders
            .update(created.order.id, UpdateOrder::new().status(OrderStatus::Finalized))
            .await
            .unwrap();
        s.products.delete_product(ProductId::new(1)).await.unwrap();
        assert!(matches!(
            s.products.get_product(ProductId::new(1)).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ingredient_is_in_use_through_product() {
        let s = services();
        seed(&s).await;
        assert!(!s.guard.is_item_in_use(ItemId::new(5)).await.unwrap());

        s.orders.create(order().with_product(1, 1)).await.unwrap();
        assert!(s.guard.is_item_in_use(ItemId::new(5)).await.unwrap());
        assert!(s.guard.is_product_in_use(ProductId::new(1)).await.unwrap());
        assert!(!s.guard.is_item_in_use(ItemId::new(10)).await.unwrap());

        let update = s
            .catalog
            .update_item(
                ItemId::new(5),
                ItemUpdate {
                    description: "Bacon".to_string(),
                    price: Money::from_cents(999),
                    extra: true,
                },
            )
            .await;
        assert!(matches!(update, Err(DomainError::Conflict(_))));
        let unchanged = s.catalog.get_item(ItemId::new(5)).await.unwrap();
        assert_eq!(unchanged.price, Money::from_cents(200));

        let delete = s.catalog.delete_item(ItemId::new(6)).await;
        assert!(matches!(delete, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn drink_is_in_use_directly() {
        let s = services();
        seed(&s).await;
        let created = s
            .orders
            .create(order().with_product(1, 1).with_drink(10, 2))
            .await
            .unwrap();

        assert!(matches!(
            s.catalog.delete_item(ItemId::new(10)).await,
            Err(DomainError::Conflict(_))
        ));

        s.orders.delete(created.order.id).await.unwrap();
        s.catalog.delete_item(ItemId::new(10)).await.unwrap();
    }

    #[tokio::test]
    async fn product_update_blocked_while_in_use() {
        let s = services();
        seed(&s).await;
        s.orders.create(order().with_product(1, 1)).await.unwrap();

        let result = s
            .products
            .update_product(
                ProductId::new(1),
                ProductDraft {
                    description: "X-Bacon".to_string(),
                    price: Money::from_cents(3000),
                    ingredients: vec![IngredientRequest::new(5, 2)],
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        let view = s.products.get_product(ProductId::new(1)).await.unwrap();
        assert_eq!(view.product.price, Money::from_cents(2590));
        assert_eq!(view.ingredients.len(), 2);
    }

    #[tokio::test]
    async fn guard_on_missing_entity_is_not_found() {
        let s = services();
        assert!(matches!(
            s.guard.is_item_in_use(ItemId::new(1)).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            s.guard.is_product_in_use(ProductId::new(1)).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn non_ingredient_leaves_no_partial_product() {
        let s = services();
        seed(&s).await;
        let links_before = s.store.ingredient_link_count().await;

        let result = s
            .products
            .create_product(
                ProductId::new(2),
                ProductDraft {
                    description: "X-Salada".to_string(),
                    price: Money::from_cents(1800),
                    ingredients: vec![IngredientRequest::new(5, 1), IngredientRequest::new(10, 1)],
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Invalid(_))));

        assert_eq!(s.store.ingredient_link_count().await, links_before);
        assert_eq!(s.products.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deletes_leave_no_orphan_links() {
        let s = services();
        seed(&s).await;
        let created = s
            .orders
            .create(order().with_product(1, 1).with_drink(10, 1))
            .await
            .unwrap();

        s.orders.delete(created.order.id).await.unwrap();
        assert_eq!(s.store.order_line_count().await, 0);

        s.products.delete_product(ProductId::new(1)).await.unwrap();
        assert_eq!(s.store.ingredient_link_count().await, 0);
    }

    #[tokio::test]
    async fn deleting_free_ingredient_drops_its_links() {
        let s = services();
        seed(&s).await;

        s.catalog.delete_item(ItemId::new(6)).await.unwrap();
        let view = s.products.get_product(ProductId::new(1)).await.unwrap();
        let ids: Vec<ItemId> = view.ingredients.iter().map(|i| i.item.id).collect();
        assert_eq!(ids, vec![ItemId::new(5)]);
        assert_eq!(s.store.ingredient_link_count().await, 1);
    }
}

mod order_updates {
    use super::*;

    #[tokio::test]
    async fn empty_product_list_preserves_lines() {
        let s = services();
        seed(&s).await;
        let created = s.orders.create(order().with_product(1, 3)).await.unwrap();

        let updated = s
            .orders
            .update(created.order.id, UpdateOrder::new().with_drink(10, 1))
            .await
            .unwrap();
        assert_eq!(updated.products, created.products);
        assert_eq!(updated.order.total, Money::from_cents(3 * 2590 + 500));
    }

    #[tokio::test]
    async fn finalized_order_survives_product_deletion() {
        let s = services();
        seed(&s).await;
        let created = s.orders.create(order().with_product(1, 1)).await.unwrap();
        s.orders
            .update(created.order.id, UpdateOrder::new().status(OrderStatus::Finalized))
            .await
            .unwrap();
        s.products.delete_product(ProductId::new(1)).await.unwrap();

        let view = s.orders.get(created.order.id).await.unwrap();
        assert_eq!(view.products.len(), 1);
        assert!(view.products[0].product.is_none());
        assert_eq!(view.order.total, Money::from_cents(2590));

        // Repricing a line whose product is gone cannot succeed.
        let result = s
            .orders
            .update(created.order.id, UpdateOrder::new().notes("late note"))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { entity: "product", .. })));
    }

    #[tokio::test]
    async fn unfinished_listing() {
        let s = services();
        seed(&s).await;
        let done = s.orders.create(order().with_product(1, 1)).await.unwrap();
        s.orders.create(order().with_product(1, 1)).await.unwrap();
        s.orders
            .update(done.order.id, UpdateOrder::new().status(OrderStatus::Finalized))
            .await
            .unwrap();

        assert_eq!(s.orders.list(OrderQuery::all()).await.unwrap().len(), 2);
        assert_eq!(s.orders.list_unfinished().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn kinds_listing() {
        let s = services();
        seed(&s).await;
        let ingredients = s.catalog.list_items(Some(ItemKind::Ingredient)).await.unwrap();
        assert_eq!(ingredients.len(), 2);
    }
}
