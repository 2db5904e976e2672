//! Command parsing and execution.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use gymshop_core::models::{Cart, ProductQuery};
use gymshop_core::{ApiClient, Config};
use tracing::info;

use crate::format::{format_amount, format_date, format_optional, truncate_string};

pub const USAGE: &str = "\
Usage: gymshop <command> [args]

Commands:
  login [username]         Sign in and store credentials
  logout                   Forget stored credentials
  whoami                   Show the signed-in account
  products [search]        List products, optionally filtered
  product <id>             Show a product with its reviews
  cart                     Show the cart
  add <product_id> [qty]   Add a product to the cart
  orders                   List orders
  wishlist                 Show the wishlist
  articles                 List articles
  workouts                 List workouts
  get <path>               GET any API path and print the JSON
  help                     Show this message";

/// Column width for product and article names
const NAME_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Logout,
    Whoami,
    Products { search: Option<String> },
    Product { id: i64 },
    Cart,
    Add { product_id: i64, quantity: u32 },
    Orders,
    Wishlist,
    Articles,
    Workouts,
    Get { path: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };
        let rest: Vec<&str> = args.collect();

        let command = match name {
            "login" => Command::Login {
                username: rest.first().map(|s| s.to_string()),
            },
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "products" => Command::Products {
                search: (!rest.is_empty()).then(|| rest.join(" ")),
            },
            "product" => Command::Product {
                id: parse_id(rest.first(), "product id")?,
            },
            "cart" => Command::Cart,
            "add" => Command::Add {
                product_id: parse_id(rest.first(), "product id")?,
                quantity: match rest.get(1) {
                    Some(q) => q
                        .parse()
                        .with_context(|| format!("Invalid quantity: {}", q))?,
                    None => 1,
                },
            },
            "orders" => Command::Orders,
            "wishlist" => Command::Wishlist,
            "articles" => Command::Articles,
            "workouts" => Command::Workouts,
            "get" => Command::Get {
                path: rest
                    .first()
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow!("Missing path"))?,
            },
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

fn parse_id(value: Option<&&str>, what: &str) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow!("Missing {}", what))?;
    value
        .parse()
        .with_context(|| format!("Invalid {}: {}", what, value))
}

pub async fn run(client: &ApiClient, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Help => println!("{}", USAGE),
        Command::Login { username } => login(client, config, username).await?,
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let user = client.current_user().await?;
            println!(
                "{} ({})",
                user.display_name(),
                format_optional(user.email.as_deref(), "no email")
            );
        }
        Command::Products { search } => {
            let query = ProductQuery {
                search,
                ..ProductQuery::default()
            };
            let page = client.list_products(&query).await?;
            for product in &page.results {
                println!(
                    "{:>6}  {:<width$}  {:>10}  {}",
                    product.id,
                    truncate_string(&product.name, NAME_WIDTH),
                    product.effective_price().to_string(),
                    if product.in_stock() { "" } else { "out of stock" },
                    width = NAME_WIDTH
                );
            }
            println!("{} of {} products", page.results.len(), page.count);
        }
        Command::Product { id } => {
            let (product, reviews) = client.product_with_reviews(id).await?;
            println!("{} - {}", product.name, product.effective_price());
            println!(
                "Category: {}",
                format_optional(product.category.as_ref().map(|c| c.name.as_str()), "-")
            );
            println!("Rating: {}", product.rating_display());
            if let Some(ref description) = product.description {
                println!("\n{}", description);
            }
            for review in &reviews {
                println!(
                    "\n{} {} on {}\n  {}",
                    review.stars(),
                    format_optional(review.user.as_deref(), "anonymous"),
                    format_date(&review.created_at),
                    review.comment
                );
            }
        }
        Command::Cart => print_cart(&client.cart().await?),
        Command::Add {
            product_id,
            quantity,
        } => {
            let cart = client.add_to_cart(product_id, quantity).await?;
            print_cart(&cart);
        }
        Command::Orders => {
            for order in client.orders().await? {
                println!(
                    "#{:<6} {:<12} {:>10}  {}",
                    order.id,
                    order.status.label(),
                    order.total.to_string(),
                    format_date(&order.created_at)
                );
            }
        }
        Command::Wishlist => {
            for item in client.wishlist().await? {
                println!(
                    "{:>6}  {:<width$}  {:>10}",
                    item.product.id,
                    truncate_string(&item.product.name, NAME_WIDTH),
                    item.product.effective_price().to_string(),
                    width = NAME_WIDTH
                );
            }
        }
        Command::Articles => {
            for article in client.articles().await?.results {
                println!(
                    "{:<width$}  {:>3} min  {}",
                    truncate_string(&article.title, NAME_WIDTH),
                    article.reading_minutes(),
                    article.slug,
                    width = NAME_WIDTH
                );
            }
        }
        Command::Workouts => {
            for workout in client.workouts().await?.results {
                println!(
                    "{:>6}  {:<width$}  {:?}, {} exercises",
                    workout.id,
                    truncate_string(&workout.title, NAME_WIDTH),
                    workout.difficulty,
                    workout.exercises.len(),
                    width = NAME_WIDTH
                );
            }
        }
        Command::Get { path } => {
            let value: serde_json::Value = client.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

async fn login(client: &ApiClient, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    client.login(&username, &password).await?;
    info!(username = %username, "Login succeeded");

    config.last_username = Some(username.clone());
    config.save()?;
    println!("Logged in as {}.", username);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for item in &cart.items {
        println!(
            "{:>3} x {:<width$}  {:>10}",
            item.quantity,
            truncate_string(&item.product.name, NAME_WIDTH),
            format_amount(item.line_total()),
            width = NAME_WIDTH
        );
    }
    println!(
        "{} items, total {}",
        cart.item_count(),
        format_amount(cart.total())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_args_is_help() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_products_joins_search_terms() {
        assert_eq!(
            Command::parse(&args(&["products", "resistance", "band"])).unwrap(),
            Command::Products {
                search: Some("resistance band".to_string())
            }
        );
        assert_eq!(
            Command::parse(&args(&["products"])).unwrap(),
            Command::Products { search: None }
        );
    }

    #[test]
    fn test_parse_add_defaults_quantity() {
        assert_eq!(
            Command::parse(&args(&["add", "12"])).unwrap(),
            Command::Add {
                product_id: 12,
                quantity: 1
            }
        );
        assert_eq!(
            Command::parse(&args(&["add", "12", "3"])).unwrap(),
            Command::Add {
                product_id: 12,
                quantity: 3
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(&args(&["add"])).is_err());
        assert!(Command::parse(&args(&["add", "x"])).is_err());
        assert!(Command::parse(&args(&["add", "1", "-2"])).is_err());
        assert!(Command::parse(&args(&["get"])).is_err());
        assert!(Command::parse(&args(&["dance"])).is_err());
    }

    #[test]
    fn test_parse_login_optional_username() {
        assert_eq!(
            Command::parse(&args(&["login", "lifter"])).unwrap(),
            Command::Login {
                username: Some("lifter".to_string())
            }
        );
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { username: None }
        );
    }
}
