//! Mapping from tabular rows (CSV export or values API) to products.
//!
//! Both sources share one header-driven mapping. Every product field has an
//! explicit default, so any header/row combination produces a product.

use super::types::{parse_price, parse_stock, Product, DEFAULT_CATEGORY, DEFAULT_TITLE};

/// Column positions resolved from a header row (case-insensitive)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
  id: Option<usize>,
  title: Option<usize>,
  name: Option<usize>,
  price: Option<usize>,
  category: Option<usize>,
  brand: Option<usize>,
  image: Option<usize>,
  description: Option<usize>,
  stock: Option<usize>,
  created_at: Option<usize>,
}

impl HeaderMap {
  pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
    let mut map = HeaderMap::default();
    for (idx, header) in headers.iter().enumerate() {
      let slot = match header.as_ref().trim().to_lowercase().as_str() {
        "id" => &mut map.id,
        "title" => &mut map.title,
        "name" => &mut map.name,
        "price" => &mut map.price,
        "category" => &mut map.category,
        "brand" => &mut map.brand,
        "image" => &mut map.image,
        "description" => &mut map.description,
        "stock" => &mut map.stock,
        "created_at" => &mut map.created_at,
        _ => continue,
      };
      // Later duplicates overwrite earlier ones, like zipping into an object
      *slot = Some(idx);
    }
    map
  }

  /// Build a product from one row; `fallback_id` is used when the id cell is blank
  pub fn product<S: AsRef<str>>(&self, row: &[S], fallback_id: String) -> Product {
    let id = non_empty(cell(row, self.id)).unwrap_or(fallback_id);
    let title = non_empty(cell(row, self.title))
      .or_else(|| non_empty(cell(row, self.name)))
      .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let category =
      non_empty(cell(row, self.category)).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Product {
      id,
      title,
      price: parse_price(cell(row, self.price)),
      category,
      brand: cell(row, self.brand).to_string(),
      image: cell(row, self.image).to_string(),
      description: cell(row, self.description).to_string(),
      stock: parse_stock(cell(row, self.stock)),
      created_at: cell(row, self.created_at).to_string(),
    }
  }
}

/// Trimmed cell at `col`, or "" when the column is unknown or the row is short
fn cell<S: AsRef<str>>(row: &[S], col: Option<usize>) -> &str {
  col
    .and_then(|i| row.get(i))
    .map(|s| s.as_ref().trim())
    .unwrap_or("")
}

fn non_empty(s: &str) -> Option<String> {
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

/// Parse a CSV export into products.
///
/// This is a plain split on newlines and commas. Quoted fields are not
/// understood, so a comma inside a cell shifts the remaining columns.
pub fn parse_csv(text: &str) -> Vec<Product> {
  let mut lines = text
    .split('\n')
    .map(|line| line.strip_suffix('\r').unwrap_or(line))
    .filter(|line| !line.is_empty());

  let header: Vec<&str> = match lines.next() {
    Some(line) => line.split(',').collect(),
    None => return Vec::new(),
  };
  let map = HeaderMap::from_headers(&header);

  lines
    .enumerate()
    .map(|(idx, line)| {
      let cols: Vec<&str> = line.split(',').collect();
      map.product(&cols, format!("csv{}", idx))
    })
    .collect()
}

/// Map values-API rows into products; the first row is the header.
///
/// Fewer than two rows means there is no data at all.
pub fn parse_table(rows: &[Vec<String>]) -> Vec<Product> {
  if rows.len() < 2 {
    return Vec::new();
  }

  let map = HeaderMap::from_headers(&rows[0]);
  rows[1..]
    .iter()
    .enumerate()
    .map(|(idx, row)| map.product(row, format!("row{}", idx)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_csv_basic() {
    let csv = "id,title,price,category,brand,image,description,stock,created_at\n\
               a1,Mouse,15.5,Input,Logi,http://img/m.png,Wireless mouse,4,2025-01-02\n\
               a2,Keyboard,40,Input,Logi,,Mechanical,0,2025-03-01\n";
    let products = parse_csv(csv);

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "a1");
    assert_eq!(products[0].title, "Mouse");
    assert_eq!(products[0].price, 15.5);
    assert_eq!(products[0].category, "Input");
    assert_eq!(products[0].brand, "Logi");
    assert_eq!(products[0].image, "http://img/m.png");
    assert_eq!(products[0].description, "Wireless mouse");
    assert_eq!(products[0].stock, 4);
    assert_eq!(products[0].created_at, "2025-01-02");
    assert_eq!(products[1].stock, 0);
    assert_eq!(products[1].image, "");
  }

  #[test]
  fn test_csv_yields_one_product_per_data_row() {
    let mut csv = String::from("id,title,price\n");
    for i in 0..25 {
      csv.push_str(&format!("id{},Item {},{}\n", i, i, i));
    }
    let products = parse_csv(&csv);
    assert_eq!(products.len(), 25);
    assert_eq!(products[24].id, "id24");
    assert_eq!(products[24].price, 24.0);
  }

  #[test]
  fn test_csv_headers_are_case_insensitive_and_trimmed() {
    let csv = " ID , Name ,PRICE\r\nx,Lamp,3\r\n";
    let products = parse_csv(csv);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "x");
    assert_eq!(products[0].title, "Lamp");
    assert_eq!(products[0].price, 3.0);
  }

  #[test]
  fn test_csv_defaults() {
    let csv = "id,title,price,category\n,,,\n";
    let products = parse_csv(csv);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "csv0");
    assert_eq!(products[0].title, DEFAULT_TITLE);
    assert_eq!(products[0].price, 0.0);
    assert_eq!(products[0].category, DEFAULT_CATEGORY);
  }

  #[test]
  fn test_csv_title_prefers_title_over_name() {
    let csv = "name,title\nfrom name,from title\nonly name,\n";
    let products = parse_csv(csv);
    assert_eq!(products[0].title, "from title");
    assert_eq!(products[1].title, "only name");
  }

  #[test]
  fn test_csv_skips_blank_lines() {
    let csv = "id,title\n\na,A\n\nb,B\n";
    let products = parse_csv(csv);
    assert_eq!(products.len(), 2);
    // Indexes count data lines only, after blanks are dropped
    let csv = "title\nA\n\nB\n";
    let products = parse_csv(csv);
    assert_eq!(products[1].id, "csv1");
  }

  #[test]
  fn test_csv_embedded_comma_shifts_columns() {
    let csv = "id,title,price\nz,\"Cable, long\",5\n";
    let products = parse_csv(csv);
    assert_eq!(products[0].title, "\"Cable");
    assert_eq!(products[0].price, 0.0);
  }

  #[test]
  fn test_csv_empty_input() {
    assert!(parse_csv("").is_empty());
    assert!(parse_csv("id,title\n").is_empty());
  }

  #[test]
  fn test_table_rows() {
    let rows = vec![
      vec!["Id".to_string(), "Title".to_string(), "Price".to_string(), "Stock".to_string()],
      vec!["t1".to_string(), "Desk".to_string(), "120".to_string(), "2".to_string()],
      vec!["".to_string(), "Chair".to_string()],
    ];
    let products = parse_table(&rows);

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "t1");
    assert_eq!(products[0].price, 120.0);
    assert_eq!(products[0].stock, 2);
    assert_eq!(products[1].id, "row1");
    assert_eq!(products[1].price, 0.0);
    assert_eq!(products[1].stock, 0);
  }

  #[test]
  fn test_table_header_only() {
    let rows = vec![vec!["id".to_string()]];
    assert!(parse_table(&rows).is_empty());
    assert!(parse_table(&[]).is_empty());
  }
}
