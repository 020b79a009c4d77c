use std::fmt;
use std::str::FromStr;

/// Named navigation targets of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Products,
    Orders,
    NewOrder,
    Cart,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Products => "/products",
            Route::Orders => "/orders",
            Route::NewOrder => "/new-order",
            Route::Cart => "/cart",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('/') {
            "/products" => Ok(Route::Products),
            "/orders" => Ok(Route::Orders),
            "/new-order" => Ok(Route::NewOrder),
            "/cart" => Ok(Route::Cart),
            other => Err(format!("unknown route '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickLink {
    pub title: &'static str,
    pub description: &'static str,
    pub route: Route,
}

pub const FEATURES: [Feature; 3] = [
    Feature {
        title: "Wide Selection",
        description: "Browse through our extensive catalog of quality products",
    },
    Feature {
        title: "Secure Shopping",
        description: "Your transactions are protected with enterprise-grade security",
    },
    Feature {
        title: "Fast Delivery",
        description: "Get your orders delivered quickly and reliably",
    },
];

pub const QUICK_LINKS: [QuickLink; 4] = [
    QuickLink {
        title: "Manage Products",
        description: "Add, edit, and organize your product catalog",
        route: Route::Products,
    },
    QuickLink {
        title: "Create Order",
        description: "Create a new order by selecting products",
        route: Route::NewOrder,
    },
    QuickLink {
        title: "View Orders",
        description: "Track and manage all customer orders",
        route: Route::Orders,
    },
    QuickLink {
        title: "Shopping Cart",
        description: "Review items and complete your purchase",
        route: Route::Cart,
    },
];

/// The landing page. Static content only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LandingView;

impl fmt::Display for LandingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Streamline Your Orders")?;
        writeln!(f)?;
        for feature in FEATURES {
            writeln!(f, "  * {}: {}", feature.title, feature.description)?;
        }
        writeln!(f)?;
        writeln!(f, "Quick links")?;
        for link in QUICK_LINKS {
            writeln!(f, "  {:<16} {:<11} {}", link.title, link.route, link.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_round_trip_through_paths() {
        for link in QUICK_LINKS {
            assert_eq!(link.route.path().parse::<Route>(), Ok(link.route));
        }
        assert_eq!("/orders/".parse::<Route>(), Ok(Route::Orders));
        assert!("/admin".parse::<Route>().is_err());
    }

    #[test]
    fn test_landing_lists_every_quick_link() {
        let rendered = LandingView.to_string();
        for path in ["/products", "/new-order", "/orders", "/cart"] {
            assert!(rendered.contains(path), "missing {}", path);
        }
    }
}
