use argon::types::value::Value;

#[allow(dead_code)]
pub const ACCOUNTS: &str = "
    create accounts id:int not null owner:varchar(8) balance:bigint active:bool
    insert accounts 1 'alice' 100 true
    insert accounts 2 'bob' 250 true
    insert accounts 3 'carol' 0 false
    insert accounts 4 'dave' 75 true
";

#[allow(dead_code)]
pub fn account(id: i32, owner: &str, balance: i64, active: bool) -> Vec<Value> {
    vec![
        Value::Int32(id),
        Value::String(owner.into()),
        Value::Int64(balance),
        Value::Boolean(active),
    ]
}
