//! Menu catalog. Plain read/seed plumbing around the store; the seed set
//! mirrors what the frontend expects to display.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

/// The seed catalog. Replaces whatever the store currently holds so seeding
/// twice does not duplicate items.
pub fn sample_menu() -> Vec<MenuItem> {
    [
        (
            "Margherita Pizza",
            "Fresh basil, tomato sauce, and mozzarella cheese on a thin crust.",
            299.0,
            "https://images.unsplash.com/photo-1604382354936-07c5d9983bd3?w=800&auto=format&fit=crop",
        ),
        (
            "Classic Cheeseburger",
            "Juicy patty topped with melted cheddar, lettuce, and onions.",
            189.0,
            "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?w=800&auto=format&fit=crop",
        ),
        (
            "Veggie Momos",
            "Steamed dumplings filled with finely chopped seasonal vegetables.",
            129.0,
            "https://images.unsplash.com/photo-1625220194771-7ebdea0b70b9?w=800&auto=format&fit=crop",
        ),
        (
            "Spicy Pepperoni",
            "Classic pepperoni with a kick of chili flakes and honey drizzle.",
            399.0,
            "https://images.unsplash.com/photo-1628840042765-356cda07504e?w=800&auto=format&fit=crop",
        ),
        (
            "Crispy Chicken Wings",
            "Six pieces of jumbo wings tossed in your choice of buffalo or BBQ sauce.",
            249.0,
            "https://images.unsplash.com/photo-1527477396000-e27163b481c2?w=800&auto=format&fit=crop",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (name, description, price, image))| MenuItem {
        id: index as u32 + 1,
        name: name.to_string(),
        description: description.to_string(),
        price,
        image: image.to_string(),
    })
    .collect()
}
