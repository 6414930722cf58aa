// Tiny query building helper for the list endpoints,
// which all need the same "optional WHERE, ORDER BY,
// LIMIT/OFFSET" treatment.

#[derive(Clone, Copy)]
pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: field.to_string()
    }
  }
}

// Decided to put "q_" in front of all args just
// because "where" is a reserved Rust keyword.
// The WHERE clauses are always glued with AND.
pub fn select_query_builder(
  q_fields: &[&str],
  q_from: &[&str],
  q_where: &[String],
  q_order: &[OrderBy],
  limit: Option<usize>,
  offset: Option<usize>
) -> String {
  let mut query = format!(
    "SELECT {} FROM {} ",
    q_fields.join(","),
    q_from.join(",")
  );
  if !q_where.is_empty() {
    query.push_str(
      &format!(
        "WHERE {} ",
        q_where.join(" AND ")
      )
    );
  }
  if !q_order.is_empty() {
    let orders: Vec<String> = q_order.iter()
      .map(|o| format!(
        "{} {}",
        o.field,
        match o.order {
          Order::Asc => "ASC",
          Order::Desc => "DESC"
        }
      ))
      .collect();
    query.push_str(&format!("ORDER BY {} ", orders.join(", ")));
  }
  if let Some(lim) = limit {
    query.push_str(
      &format!(
        "LIMIT {} ",
        lim
      )
    );
    if let Some(off) = offset {
      query.push_str(
        &format!(
          "OFFSET {} ",
          off
        )
      );
    }
  }
  query
}
