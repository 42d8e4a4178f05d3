//! Command-line commands typed after `:` and their autocomplete.

use crate::filters::{FilterState, SortKey, ALL_CATEGORIES};
use crate::route::Route;
use crate::state::Action;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "catalog", "home"],
    description: "Back to the catalog",
  },
  Command {
    name: "cart",
    aliases: &["c", "basket"],
    description: "Show or hide the cart",
  },
  Command {
    name: "checkout",
    aliases: &["order", "send"],
    description: "Send the order by message",
  },
  Command {
    name: "clear",
    aliases: &["empty"],
    description: "Empty the cart",
  },
  Command {
    name: "search",
    aliases: &["find"],
    description: "Search titles and descriptions",
  },
  Command {
    name: "category",
    aliases: &["cat"],
    description: "Filter by category (or all)",
  },
  Command {
    name: "brand",
    aliases: &["b"],
    description: "Filter by brand (or all)",
  },
  Command {
    name: "min",
    aliases: &["from"],
    description: "Minimum price (blank clears)",
  },
  Command {
    name: "max",
    aliases: &["to"],
    description: "Maximum price (blank clears)",
  },
  Command {
    name: "instock",
    aliases: &["stock", "available"],
    description: "Toggle in-stock only",
  },
  Command {
    name: "sort",
    aliases: &["order-by"],
    description: "relevance, asc, desc or newest",
  },
  Command {
    name: "reset",
    aliases: &["r"],
    description: "Clear every filter",
  },
  Command {
    name: "open",
    aliases: &["go", "product"],
    description: "Open a product by id",
  },
  Command {
    name: "refresh",
    aliases: &["reload"],
    description: "Fetch the catalog again",
  },
  Command {
    name: "theme",
    aliases: &["dark", "light"],
    description: "Toggle light and dark theme",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit gnstore",
  },
];

/// What a submitted command line asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
  /// Change application state
  Dispatch(Action),
  ToggleCart,
  Refresh,
  Quit,
}

/// Split a command line into its name and the rest
pub fn split(input: &str) -> (&str, &str) {
  let input = input.trim();
  match input.split_once(char::is_whitespace) {
    Some((name, rest)) => (name, rest.trim()),
    None => (input, ""),
  }
}

/// Resolve a command line to what it should do
pub fn interpret(input: &str) -> Result<Invocation, String> {
  let (name, args) = split(input);
  let name = name.to_lowercase();
  let command = COMMANDS
    .iter()
    .find(|c| c.name == name || c.aliases.contains(&name.as_str()))
    .ok_or_else(|| format!("Unknown command: {}", name))?;

  let invocation = match command.name {
    "products" => Invocation::Dispatch(Action::Navigate(Route::Catalog)),
    "cart" => Invocation::ToggleCart,
    "checkout" => Invocation::Dispatch(Action::Checkout),
    "clear" => Invocation::Dispatch(Action::ClearCart),
    "search" => Invocation::Dispatch(Action::SetQuery(args.to_string())),
    "category" => {
      let category = if args.is_empty() { ALL_CATEGORIES } else { args };
      Invocation::Dispatch(Action::SetCategory(category.to_string()))
    }
    "brand" => {
      let brand = match args {
        "" | "all" => None,
        brand => Some(brand.to_string()),
      };
      Invocation::Dispatch(Action::SetBrand(brand))
    }
    "min" => Invocation::Dispatch(Action::SetMinPrice(price_arg(args)?)),
    "max" => Invocation::Dispatch(Action::SetMaxPrice(price_arg(args)?)),
    "instock" => Invocation::Dispatch(Action::ToggleInStock),
    "sort" => {
      let sort = SortKey::parse(args).ok_or_else(|| format!("Unknown sort: {}", args))?;
      Invocation::Dispatch(Action::SetSort(sort))
    }
    "reset" => Invocation::Dispatch(Action::ResetFilters),
    "open" => {
      if args.is_empty() {
        return Err("Usage: open <product id>".to_string());
      }
      Invocation::Dispatch(Action::Navigate(Route::ProductDetail(args.to_string())))
    }
    "refresh" => Invocation::Refresh,
    "theme" => Invocation::Dispatch(Action::ToggleTheme),
    "quit" => Invocation::Quit,
    other => return Err(format!("Unknown command: {}", other)),
  };
  Ok(invocation)
}

fn price_arg(args: &str) -> Result<Option<f64>, String> {
  if args.is_empty() {
    return Ok(None);
  }
  FilterState::parse_price(args)
    .map(Some)
    .ok_or_else(|| format!("Not a price: {}", args))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable, so equal priorities keep table order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
