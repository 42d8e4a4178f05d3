use super::types::Product;

/// Built-in catalog shown when no source is configured or a fetch fails
pub fn demo_products() -> Vec<Product> {
  vec![
    Product {
      id: "p1".to_string(),
      title: "Wireless Headphones".to_string(),
      price: 29.99,
      category: "Headphones".to_string(),
      brand: "BrandA".to_string(),
      image: "https://via.placeholder.com/800x600?text=Headphone".to_string(),
      description: "High quality wireless headphones".to_string(),
      stock: 10,
      created_at: "2025-01-01".to_string(),
    },
    Product {
      id: "p2".to_string(),
      title: "USB Type-C Cable".to_string(),
      price: 9.5,
      category: "Cables".to_string(),
      brand: "BrandB".to_string(),
      image: "https://via.placeholder.com/800x600?text=Cable".to_string(),
      description: "Durable charging cable".to_string(),
      stock: 50,
      created_at: "2025-02-14".to_string(),
    },
    Product {
      id: "p3".to_string(),
      title: "Screen Protector".to_string(),
      price: 4.99,
      category: "Screens".to_string(),
      brand: "BrandC".to_string(),
      image: "https://via.placeholder.com/800x600?text=Screen+Protector".to_string(),
      description: "Tempered glass screen protector".to_string(),
      stock: 100,
      created_at: "2025-03-10".to_string(),
    },
  ]
}
