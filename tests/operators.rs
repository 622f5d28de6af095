//! # Operator Tree Integration Tests
//!
//! Drives complete physical operator trees over in-memory tables:
//!
//! - ORDER BY / LIMIT over a scan, NULL placement included
//! - projection naming and arithmetic over scanned rows
//! - GROUP BY with aggregates, nested-loop joins
//! - all-or-nothing INSERT and rolled-back UPDATE through a failing transaction
//! - UPDATE and DELETE routed through a view
//! - correlated scalar subqueries evaluated against the outer row

use eyre::{bail, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use turvec::records::{FieldDef, Record};
use turvec::sql::aggregate::AggregateKind;
use turvec::sql::executor::{
    collect_rows, DeleteOperator, GroupByOperator, InsertOperator, LimitOperator,
    NestedLoopJoinOperator, OrderByOperator, OrderByUnit, PhysicalOperator, PredicateOperator,
    ProjectOperator, TableScanOperator, UpdateOperator, ViewScanOperator,
};
use turvec::sql::expr::{
    AggregateExpr, ArithmeticExpr, ArithmeticOp, CompOp, ComparisonExpr, Expression, FieldExpr,
    SubqueryExpr, ValueExpr,
};
use turvec::sql::tuple::ValueListTuple;
use turvec::storage::{
    ReadWriteMode, Relation, Table, Trx, TrxRef, VacuousTrx, View, ViewColumn, Visibility,
};
use turvec::{DataType, ErrorCode, ExecError, Value};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn emp() -> Arc<Table> {
    let table = Table::create(
        "emp",
        vec![
            FieldDef::int("id"),
            FieldDef::chars("dept", 4),
            FieldDef::int("salary").nullable(),
        ],
    )
    .unwrap();
    let rows = [
        (1, "a", Some(10)),
        (2, "a", Some(30)),
        (3, "b", Some(20)),
        (4, "b", Some(5)),
        (5, "c", None),
    ];
    for (id, dept, salary) in rows {
        let salary = salary.map_or(Value::Null, Value::Int);
        let mut record = table
            .make_record(&[Value::Int(id), Value::chars(dept), salary])
            .unwrap();
        table.insert_record(&mut record).unwrap();
    }
    table
}

fn scan(table: &Arc<Table>, alias: Option<&str>) -> Box<dyn PhysicalOperator> {
    Box::new(TableScanOperator::new(
        table.clone(),
        alias.map(str::to_string),
        ReadWriteMode::ReadOnly,
        vec![],
    ))
}

fn write_scan(table: &Arc<Table>) -> Box<dyn PhysicalOperator> {
    Box::new(TableScanOperator::new(
        table.clone(),
        None,
        ReadWriteMode::ReadWrite,
        vec![],
    ))
}

fn field(table: &str, name: &str, ty: DataType) -> Expression {
    FieldExpr::new(table, name, ty).into()
}

fn eq(left: Expression, right: Expression) -> Expression {
    ComparisonExpr::new(CompOp::Equal, left, right).into()
}

fn run(op: &mut dyn PhysicalOperator) -> Vec<ValueListTuple> {
    collect_rows(op, VacuousTrx::shared()).unwrap()
}

fn first_cells(rows: &[ValueListTuple]) -> Vec<Value<'static>> {
    rows.iter().map(|r| r.cells()[0].clone()).collect()
}

fn ints(values: &[i32]) -> Vec<Value<'static>> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

fn column(table: &Arc<Table>, name: &str) -> Vec<Value<'static>> {
    let field = table.meta().field(name).unwrap().clone();
    table
        .scan_rids()
        .into_iter()
        .map(|rid| table.get_record(rid).unwrap().get_field(&field).unwrap().into_owned())
        .collect()
}

/// Passes every call through to the relation, except the `fail_on`-th write
/// (1-based, counting inserts and updates), which fails.
struct FlakyTrx {
    fail_on: usize,
    writes: AtomicUsize,
}

impl FlakyTrx {
    fn shared(fail_on: usize) -> Arc<FlakyTrx> {
        Arc::new(FlakyTrx {
            fail_on,
            writes: AtomicUsize::new(0),
        })
    }

    fn tick(&self) -> Result<()> {
        let call = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            bail!(ExecError::Internal(format!("injected failure on write {}", call)));
        }
        Ok(())
    }
}

impl Trx for FlakyTrx {
    fn insert_record(&self, relation: &Relation, record: &mut Record) -> Result<()> {
        self.tick()?;
        relation.insert_record(record)
    }

    fn delete_record(&self, relation: &Relation, record: &Record) -> Result<()> {
        relation.delete_record(record)
    }

    fn update_record(&self, relation: &Relation, old: &Record, new: &Record) -> Result<()> {
        self.tick()?;
        relation.update_record(old, new)
    }

    fn visit_record(&self, _: &Relation, _: &Record, _: ReadWriteMode) -> Result<Visibility> {
        Ok(Visibility::Visible)
    }
}

// ============================================================================
// ORDER BY / LIMIT / PROJECT
// ============================================================================

mod order_limit_tests {
    use super::*;

    fn by_salary(units: Vec<OrderByUnit>) -> OrderByOperator {
        let table = emp();
        OrderByOperator::new(scan(&table, None), units)
    }

    #[test]
    fn ascending_puts_null_first() {
        let salary = field("emp", "salary", DataType::Ints);
        let mut op = by_salary(vec![OrderByUnit::asc(salary)]);
        let rows = run(&mut op);
        assert_eq!(first_cells(&rows), ints(&[5, 4, 1, 3, 2]));
    }

    #[test]
    fn descending_puts_null_last() {
        let salary = field("emp", "salary", DataType::Ints);
        let mut op = by_salary(vec![OrderByUnit::desc(salary)]);
        let rows = run(&mut op);
        assert_eq!(first_cells(&rows), ints(&[2, 3, 1, 4, 5]));
    }

    #[test]
    fn ties_keep_input_order_and_later_keys_break_them() {
        let dept = field("emp", "dept", DataType::Chars);
        let mut op = by_salary(vec![OrderByUnit::desc(dept)]);
        assert_eq!(first_cells(&run(&mut op)), ints(&[5, 3, 4, 1, 2]));

        let dept = field("emp", "dept", DataType::Chars);
        let id = field("emp", "id", DataType::Ints);
        let mut op = by_salary(vec![OrderByUnit::asc(dept), OrderByUnit::desc(id)]);
        assert_eq!(first_cells(&run(&mut op)), ints(&[2, 1, 4, 3, 5]));
    }

    #[test]
    fn limit_over_sort_keeps_top_rows() {
        let salary = field("emp", "salary", DataType::Ints);
        let sorted = by_salary(vec![OrderByUnit::desc(salary)]);
        let mut op = LimitOperator::new(Box::new(sorted), 2);
        assert_eq!(first_cells(&run(&mut op)), ints(&[2, 3]));
    }

    #[test]
    fn limit_zero_and_limit_past_end() {
        let table = emp();
        let mut none = LimitOperator::new(scan(&table, None), 0);
        assert!(run(&mut none).is_empty());

        let mut all = LimitOperator::new(scan(&table, None), 100);
        assert_eq!(run(&mut all).len(), 5);
    }

    #[test]
    fn operators_can_be_reopened() {
        let table = emp();
        let mut op = LimitOperator::new(scan(&table, None), 3);
        assert_eq!(run(&mut op).len(), 3);
        assert_eq!(run(&mut op).len(), 3);
    }

    #[test]
    fn project_names_fields_and_expressions() {
        let table = emp();
        let doubled: Expression = ArithmeticExpr::new(
            ArithmeticOp::Mul,
            field("emp", "salary", DataType::Ints),
            Some(Value::Int(2).into()),
        )
        .into();
        let mut op = ProjectOperator::new(
            scan(&table, None),
            vec![field("emp", "id", DataType::Ints), doubled],
        );
        let rows = run(&mut op);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].cells(), &[Value::Int(2), Value::Int(60)]);
        assert!(rows[4].cells()[1].is_null());
        assert_eq!(rows[0].specs()[0].field, "id");
        assert_eq!(rows[0].specs()[1].alias, "salary*2");
    }
}

// ============================================================================
// GROUP BY / JOIN
// ============================================================================

mod group_join_tests {
    use super::*;

    #[test]
    fn group_by_dept_with_count_sum_avg() {
        let table = emp();
        let salary = || field("emp", "salary", DataType::Ints);
        let mut op = GroupByOperator::new(
            scan(&table, None),
            vec![field("emp", "dept", DataType::Chars)],
            vec![
                AggregateExpr::new(AggregateKind::Count, salary()),
                AggregateExpr::new(AggregateKind::Sum, salary()),
                AggregateExpr::new(AggregateKind::Avg, salary()),
            ],
        );
        let rows = run(&mut op);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].cells(),
            &[Value::chars("a"), Value::Int(2), Value::Int(40), Value::Float(20.0)]
        );
        assert_eq!(
            rows[1].cells(),
            &[Value::chars("b"), Value::Int(2), Value::Int(25), Value::Float(12.5)]
        );
        assert_eq!(rows[2].cells()[1], Value::Int(0));
        assert!(rows[2].cells()[2].is_null());
        assert!(rows[2].cells()[3].is_null());
    }

    #[test]
    fn scalar_min_max_over_whole_table() {
        let table = emp();
        let salary = || field("emp", "salary", DataType::Ints);
        let mut op = GroupByOperator::new(
            scan(&table, None),
            vec![],
            vec![
                AggregateExpr::new(AggregateKind::Min, salary()),
                AggregateExpr::new(AggregateKind::Max, salary()),
            ],
        );
        let rows = run(&mut op);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells(), &[Value::Int(5), Value::Int(30)]);
    }

    fn depts() -> Arc<Table> {
        let table = Table::create("dept", vec![FieldDef::chars("code", 4), FieldDef::chars("title", 8)]).unwrap();
        for (code, title) in [("a", "eng"), ("b", "ops"), ("z", "empty")] {
            let mut record = table.make_record(&[Value::chars(code), Value::chars(title)]).unwrap();
            table.insert_record(&mut record).unwrap();
        }
        table
    }

    #[test]
    fn inner_join_on_dept_code() {
        let (e, d) = (emp(), depts());
        let condition = eq(
            field("emp", "dept", DataType::Chars),
            field("dept", "code", DataType::Chars),
        );
        let mut op = NestedLoopJoinOperator::new(scan(&e, None), scan(&d, None), Some(condition));
        let rows = run(&mut op);

        let pairs: Vec<(Value, Value)> = rows
            .iter()
            .map(|r| (r.cells()[0].clone(), r.cells()[4].clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Value::Int(1), Value::chars("eng")),
                (Value::Int(2), Value::chars("eng")),
                (Value::Int(3), Value::chars("ops")),
                (Value::Int(4), Value::chars("ops")),
            ]
        );
        assert_eq!(rows[0].specs()[3].table, "dept");
    }

    #[test]
    fn join_without_condition_is_cross_product() {
        let (e, d) = (emp(), depts());
        let mut op = NestedLoopJoinOperator::new(scan(&e, None), scan(&d, None), None);
        assert_eq!(run(&mut op).len(), 15);
    }

    #[test]
    fn self_join_through_aliases() {
        let e = emp();
        let condition = ComparisonExpr::new(
            CompOp::LessThan,
            field("x", "salary", DataType::Ints),
            field("y", "salary", DataType::Ints),
        )
        .into();
        let same_dept = eq(
            field("x", "dept", DataType::Chars),
            field("y", "dept", DataType::Chars),
        );
        let join = NestedLoopJoinOperator::new(scan(&e, Some("x")), scan(&e, Some("y")), Some(condition));
        let mut op = PredicateOperator::new(Box::new(join), same_dept);
        let rows = run(&mut op);
        let ids: Vec<(Value, Value)> = rows
            .iter()
            .map(|r| (r.cells()[0].clone(), r.cells()[3].clone()))
            .collect();
        assert_eq!(ids, vec![(Value::Int(1), Value::Int(2)), (Value::Int(4), Value::Int(3))]);
    }
}

// ============================================================================
// ATOMIC DML
// ============================================================================

mod dml_tests {
    use super::*;

    fn numbers() -> Arc<Table> {
        Table::create("n", vec![FieldDef::int("a"), FieldDef::chars("s", 4).nullable()]).unwrap()
    }

    fn rows(values: &[i32]) -> Vec<Vec<Value<'static>>> {
        values.iter().map(|v| vec![Value::Int(*v), Value::chars("x")]).collect()
    }

    #[test]
    fn insert_counts_rows() {
        let table = numbers();
        let mut op = InsertOperator::new(table.clone().into(), rows(&[1, 2, 3]));
        op.open(VacuousTrx::shared()).unwrap();
        assert!(!op.next().unwrap());
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 3);
        assert_eq!(column(&table, "a"), ints(&[1, 2, 3]));
    }

    #[test]
    fn insert_failure_undoes_earlier_rows() {
        let table = numbers();
        let trx = FlakyTrx::shared(3);
        let mut op = InsertOperator::new(table.clone().into(), rows(&[1, 2, 3, 4]));
        let err = op.open(trx.clone()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::Internal));
        assert_eq!(table.row_count(), 0);
        assert_eq!(op.affected_rows(), 0);
    }

    #[test]
    fn invalid_row_aborts_before_any_write() {
        let table = numbers();
        let trx = FlakyTrx::shared(usize::MAX);
        let mut bad = rows(&[1, 2]);
        bad.push(vec![Value::Null, Value::chars("x")]);
        let mut op = InsertOperator::new(table.clone().into(), bad);
        let err = op.open(trx.clone()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::NotNullableValue));
        assert_eq!(trx.writes.load(Ordering::SeqCst), 0);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn insert_rejects_overlong_and_mistyped_values() {
        let table = numbers();
        let mut op = InsertOperator::new(table.clone().into(), vec![vec![Value::Int(1), Value::chars("toolong")]]);
        let err = op.open(VacuousTrx::shared()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::ValueTooLong));

        let mut op = InsertOperator::new(table.clone().into(), vec![vec![Value::Date(20240101), Value::chars("x")]]);
        let err = op.open(VacuousTrx::shared()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::SchemaFieldTypeMismatch));
        assert_eq!(table.row_count(), 0);
    }

    fn filled() -> Arc<Table> {
        let table = numbers();
        let mut op = InsertOperator::new(table.clone().into(), rows(&[1, 2, 3]));
        op.open(VacuousTrx::shared()).unwrap();
        table
    }

    fn plus_ten() -> Vec<(String, Expression)> {
        let expr = ArithmeticExpr::new(
            ArithmeticOp::Add,
            field("n", "a", DataType::Ints),
            Some(Value::Int(10).into()),
        );
        vec![("a".to_string(), expr.into())]
    }

    #[test]
    fn update_applies_to_every_row() {
        let table = filled();
        let mut op = UpdateOperator::new(write_scan(&table), table.clone().into(), plus_ten()).unwrap();
        op.open(VacuousTrx::shared()).unwrap();
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 3);
        assert_eq!(column(&table, "a"), ints(&[11, 12, 13]));
    }

    #[test]
    fn update_failure_restores_earlier_rows() {
        let table = filled();
        let trx = FlakyTrx::shared(2);
        let mut op = UpdateOperator::new(write_scan(&table), table.clone().into(), plus_ten()).unwrap();
        let err = op.open(trx.clone()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::Internal));
        assert_eq!(column(&table, "a"), ints(&[1, 2, 3]));
        assert_eq!(trx.writes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn update_cast_error_leaves_table_untouched() {
        let table = filled();
        let assignments = vec![("s".to_string(), ValueExpr::new(Value::chars("waytoolong")).into())];
        let mut op = UpdateOperator::new(write_scan(&table), table.clone().into(), assignments).unwrap();
        let err = op.open(VacuousTrx::shared()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::ValueTooLong));
        assert_eq!(column(&table, "s"), vec![Value::chars("x"); 3]);
    }

    #[test]
    fn update_of_unknown_field_fails_at_construction() {
        let table = filled();
        let assignments = vec![("nope".to_string(), ValueExpr::new(Value::Int(1)).into())];
        let err = UpdateOperator::new(write_scan(&table), table.into(), assignments)
            .err()
            .unwrap();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::SchemaFieldMissing));
    }

    #[test]
    fn delete_with_predicate() {
        let table = filled();
        let at_least_two = ComparisonExpr::new(
            CompOp::GreaterEqual,
            field("n", "a", DataType::Ints),
            Value::Int(2).into(),
        );
        let child = Box::new(TableScanOperator::new(
            table.clone(),
            None,
            ReadWriteMode::ReadWrite,
            vec![at_least_two.into()],
        ));
        let mut op = DeleteOperator::new(child, table.clone().into());
        op.open(VacuousTrx::shared()).unwrap();
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 2);
        assert_eq!(column(&table, "a"), ints(&[1]));
    }
}

// ============================================================================
// VIEWS
// ============================================================================

mod view_tests {
    use super::*;

    fn emp_view(table: &Arc<Table>) -> Arc<View> {
        let view = View::create(
            "emp_v",
            vec![table.clone()],
            vec![ViewColumn::field("id"), ViewColumn::field("salary")],
            false,
        )
        .unwrap();
        Arc::new(view)
    }

    fn view_scan(view: &Arc<View>, table: &Arc<Table>, predicates: Vec<Expression>) -> Box<dyn PhysicalOperator> {
        let child = ProjectOperator::new(
            scan(table, None),
            vec![
                field("emp", "id", DataType::Ints),
                field("emp", "salary", DataType::Ints),
            ],
        );
        Box::new(ViewScanOperator::new(
            view.clone(),
            None,
            Box::new(child),
            predicates,
            ReadWriteMode::ReadWrite,
        ))
    }

    #[test]
    fn scan_through_view_filters_on_view_fields() {
        let table = emp();
        let view = emp_view(&table);
        let rich = ComparisonExpr::new(
            CompOp::GreaterThan,
            field("emp_v", "salary", DataType::Ints),
            Value::Int(15).into(),
        );
        let mut op = view_scan(&view, &table, vec![rich.into()]);
        let rows = run(&mut *op);
        assert_eq!(first_cells(&rows), ints(&[2, 3]));
        assert_eq!(rows[0].specs()[0].table, "emp_v");
    }

    #[test]
    fn update_through_view_writes_base_rows() {
        let table = emp();
        let view = emp_view(&table);
        let only_one = eq(field("emp_v", "id", DataType::Ints), Value::Int(4).into());
        let assignments = vec![("salary".to_string(), ValueExpr::new(Value::Int(99)).into())];
        let mut op =
            UpdateOperator::new(view_scan(&view, &table, vec![only_one]), view.clone().into(), assignments).unwrap();
        op.open(VacuousTrx::shared()).unwrap();
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 1);
        assert_eq!(column(&table, "salary")[3], Value::Int(99));
        assert_eq!(column(&table, "dept")[3], Value::chars("b"));
    }

    #[test]
    fn delete_through_view_removes_base_rows() {
        let table = emp();
        let view = emp_view(&table);
        let dept_a = ComparisonExpr::new(
            CompOp::LessEqual,
            field("emp_v", "id", DataType::Ints),
            Value::Int(2).into(),
        );
        let mut op = DeleteOperator::new(view_scan(&view, &table, vec![dept_a.into()]), view.clone().into());
        op.open(VacuousTrx::shared()).unwrap();
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 2);
        assert_eq!(column(&table, "id"), ints(&[3, 4, 5]));
    }

    #[test]
    fn insert_through_view_leaves_unmapped_fields_null() {
        let table = Table::create(
            "p",
            vec![FieldDef::int("id"), FieldDef::chars("note", 8).nullable()],
        )
        .unwrap();
        let view: Arc<View> = Arc::new(
            View::create("pv", vec![table.clone()], vec![ViewColumn::field("id")], false).unwrap(),
        );
        let mut op = InsertOperator::new(view.into(), vec![vec![Value::Int(7)], vec![Value::Int(8)]]);
        op.open(VacuousTrx::shared()).unwrap();
        assert_eq!(column(&table, "id"), ints(&[7, 8]));
        assert!(column(&table, "note").iter().all(Value::is_null));
    }
}

// ============================================================================
// SUBQUERIES
// ============================================================================

mod subquery_tests {
    use super::*;

    /// `SELECT MAX(e2.salary) FROM emp e2 WHERE e2.dept = e.dept`
    fn dept_max(table: &Arc<Table>) -> Expression {
        let correlated = eq(
            field("e2", "dept", DataType::Chars),
            field("e", "dept", DataType::Chars),
        );
        let inner = TableScanOperator::new(
            table.clone(),
            Some("e2".to_string()),
            ReadWriteMode::ReadOnly,
            vec![correlated],
        );
        let max = GroupByOperator::new(
            Box::new(inner),
            vec![],
            vec![AggregateExpr::new(AggregateKind::Max, field("e2", "salary", DataType::Ints))],
        );
        SubqueryExpr::new(Box::new(max), vec![DataType::Ints]).unwrap().into()
    }

    #[test]
    fn correlated_scalar_subquery_sees_outer_row() {
        let table = emp();
        let top_earner = eq(field("e", "salary", DataType::Ints), dept_max(&table));
        let mut op = PredicateOperator::new(scan(&table, Some("e")), top_earner);
        let rows = run(&mut op);
        assert_eq!(first_cells(&rows), ints(&[2, 3]));
    }

    #[test]
    fn scalar_subquery_with_many_rows_is_an_error() {
        let table = emp();
        let every_salary = ProjectOperator::new(
            scan(&table, Some("e2")),
            vec![field("e2", "salary", DataType::Ints)],
        );
        let sub: Expression = SubqueryExpr::new(Box::new(every_salary), vec![DataType::Ints])
            .unwrap()
            .into();
        let mut op = PredicateOperator::new(
            scan(&table, Some("e")),
            eq(field("e", "salary", DataType::Ints), sub),
        );
        let err = collect_rows(&mut op, VacuousTrx::shared()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::SubqueryReturnedMultipleRows));
    }

    #[test]
    fn in_subquery_matches_any_row() {
        let table = emp();
        let depts = Table::create("d", vec![FieldDef::chars("code", 4)]).unwrap();
        for code in ["b", "c"] {
            let mut r = depts.make_record(&[Value::chars(code)]).unwrap();
            depts.insert_record(&mut r).unwrap();
        }
        let codes = ProjectOperator::new(scan(&depts, None), vec![field("d", "code", DataType::Chars)]);
        let sub: Expression = SubqueryExpr::new(Box::new(codes), vec![DataType::Chars])
            .unwrap()
            .into();
        let in_depts = ComparisonExpr::new(CompOp::In, field("emp", "dept", DataType::Chars), sub);
        let mut op = PredicateOperator::new(scan(&table, None), in_depts.into());
        assert_eq!(first_cells(&run(&mut op)), ints(&[3, 4, 5]));
    }

    #[test]
    fn subquery_must_project_one_column() {
        let table = emp();
        let err = SubqueryExpr::new(scan(&table, None), vec![DataType::Ints, DataType::Chars])
            .err()
            .unwrap();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::TooLongSubqueryExpr));
    }

    #[test]
    fn correlated_subquery_reruns_after_reopen() {
        let table = emp();
        let trx: TrxRef = VacuousTrx::shared();
        let top_earner = eq(field("e", "salary", DataType::Ints), dept_max(&table));
        let mut op = PredicateOperator::new(scan(&table, Some("e")), top_earner);
        assert_eq!(collect_rows(&mut op, trx.clone()).unwrap().len(), 2);
        assert_eq!(collect_rows(&mut op, trx).unwrap().len(), 2);
    }
}
