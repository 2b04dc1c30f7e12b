//! Hand-off to an external router.

use crate::ir::HttpMethod;

/// One routable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    /// Path template, or the webhook name when `webhook` is set.
    pub path: String,
    pub operation_id: Option<String>,
    pub webhook: bool,
}

/// Receives routes from [`DocumentBuilder::bind_routes`](super::DocumentBuilder::bind_routes).
pub trait RouteBinder {
    fn bind(&mut self, route: &Route);
}

/// A handler bound to a route: `(context, validated request) -> response`.
pub trait Handler<Ctx, Req> {
    type Response;

    fn handle(&self, ctx: &Ctx, request: Req) -> Self::Response;
}

impl<Ctx, Req, Res, F> Handler<Ctx, Req> for F
where
    F: Fn(&Ctx, Req) -> Res,
{
    type Response = Res;

    fn handle(&self, ctx: &Ctx, request: Req) -> Res {
        self(ctx, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table(Vec<String>);

    impl RouteBinder for Table {
        fn bind(&mut self, route: &Route) {
            self.0.push(format!("{} {}", route.method, route.path));
        }
    }

    #[test]
    fn test_binder_receives_routes() {
        let mut table = Table(Vec::new());
        table.bind(&Route {
            method: HttpMethod::Get,
            path: "/items/{id}".into(),
            operation_id: Some("getItem".into()),
            webhook: false,
        });
        assert_eq!(table.0, vec!["GET /items/{id}"]);
    }

    #[test]
    fn test_closure_is_handler() {
        let handler = |ctx: &u32, req: u32| ctx + req;
        assert_eq!(handler.handle(&2, 3), 5);
    }
}
