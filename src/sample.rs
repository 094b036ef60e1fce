// Canned demo tables keyed off a free-text description

use crate::data::{Cell, TableContent};

macro_rules! cells {
    ($($v:expr),* $(,)?) => {
        vec![$(Cell::from($v)),*]
    };
}

/// Pick a sample table by keyword: sales, staff, inventory, or a generic grid
pub fn mock_table(description: &str) -> TableContent {
    let has = |words: &[&str]| words.iter().any(|w| description.contains(w));

    if has(&["销售", "业绩"]) {
        TableContent::new(
            "销售数据",
            vec![
                cells!["月份", "销售额", "目标", "达成率"],
                cells!["1月", 125000, 120000, "104%"],
                cells!["2月", 132000, 130000, "102%"],
                cells!["3月", 145000, 140000, "104%"],
                cells!["4月", 138000, 140000, "99%"],
                cells!["5月", 152000, 150000, "101%"],
                cells!["6月", 160000, 155000, "103%"],
                cells!["总计", 852000, 835000, "102%"],
            ],
        )
    } else if has(&["员工", "人事"]) {
        TableContent::new(
            "员工信息",
            vec![
                cells!["员工ID", "姓名", "部门", "职位", "入职日期", "薪资"],
                cells!["EMP001", "张三", "技术部", "高级工程师", "2020-01-15", 15000],
                cells!["EMP002", "李四", "市场部", "市场经理", "2021-03-20", 12000],
                cells!["EMP003", "王五", "财务部", "会计", "2019-07-10", 10000],
                cells!["EMP004", "赵六", "人力资源部", "HR专员", "2022-05-05", 8000],
                cells!["EMP005", "钱七", "销售部", "销售总监", "2018-11-30", 20000],
            ],
        )
    } else if has(&["产品", "库存"]) {
        TableContent::new(
            "产品库存",
            vec![
                cells!["产品ID", "产品名称", "类别", "单价", "库存数量", "供应商"],
                cells!["P001", "笔记本电脑", "电子产品", 5899, 120, "科技公司A"],
                cells!["P002", "无线鼠标", "电子产品", 99, 500, "科技公司B"],
                cells!["P003", "办公椅", "办公用品", 399, 80, "家具公司C"],
                cells!["P004", "打印纸", "办公用品", 25, 1000, "文具公司D"],
                cells!["P005", "保温杯", "日用品", 89, 300, "家居公司E"],
            ],
        )
    } else {
        TableContent::new(
            "示例数据",
            vec![
                cells!["列1", "列2", "列3"],
                cells!["数据1", "数据2", "数据3"],
                cells!["数据4", "数据5", "数据6"],
                cells!["数据7", "数据8", "数据9"],
            ],
        )
    }
}
