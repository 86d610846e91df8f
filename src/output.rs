use priotasks::model::{format_date, format_time, Task};
use priotasks::score::value_label;
use priotasks::Settings;

fn icon(task: &Task) -> char {
    if task.is_completed() {
        'x'
    } else if task.wip {
        '*'
    } else {
        '.'
    }
}

fn tag_list(task: &Task) -> String {
    task.tags
        .iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_task_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:        {}\n", task.id));
    out.push_str(&format!("Title:     {}\n", task.title));
    out.push_str(&format!("Priority:  {}\n", task.priority.as_str()));
    out.push_str(&format!("Impact:    {}\n", task.impact.as_str()));
    out.push_str(&format!(
        "Cost:      {} ({})\n",
        task.cost.as_str(),
        task.cost.estimate_label()
    ));
    out.push_str(&format!("Fun:       {}\n", task.fun.as_str()));
    out.push_str(&format!("Value:     {:.2} {}\n", task.value, value_label(task.value)));
    if task.wip {
        out.push_str("Wip:       yes\n");
    }
    if task.planned {
        out.push_str("Planned:   yes\n");
    }
    if !task.tags.is_empty() {
        out.push_str(&format!("Tags:      {}\n", tag_list(task)));
    }
    out.push_str(&format!("Created:   {}\n", format_time(&task.created)));
    out.push_str(&format!("Updated:   {}\n", format_time(&task.updated)));
    if let Some(completed) = &task.completed {
        out.push_str(&format!("Completed: {}\n", format_time(completed)));
    }
    if !task.content.is_empty() && task.content != task.title {
        out.push('\n');
        out.push_str(&task.content);
        out.push('\n');
    }
    out
}

pub fn format_task_list(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        let tags = if task.tags.is_empty() {
            String::new()
        } else {
            format!("  {}", tag_list(task))
        };
        out.push_str(&format!(
            "{} {} {:<6} {:>4} {:<4} {}{tags}\n",
            icon(task),
            task.id,
            task.priority.as_str(),
            task.cost.estimate_label(),
            value_label(task.value),
            task.title,
        ));
    }
    out
}

pub fn format_settings(settings: &Settings) -> String {
    let q = &settings.tasks_query;
    let mut out = String::new();
    let flag = |b: bool| if b { "yes" } else { "no" };
    out.push_str(&format!("Hide completed: {}\n", flag(q.filter_completed)));
    out.push_str(&format!("Hide open:      {}\n", flag(q.filter_incompleted)));
    let range = |d: &Option<chrono::NaiveDate>| d.as_ref().map(format_date).unwrap_or_else(|| "-".into());
    out.push_str(&format!(
        "Completed:      {} .. {}\n",
        range(&q.completed_from),
        range(&q.completed_to)
    ));
    if q.filter_wip || q.filter_non_wip {
        out.push_str(&format!(
            "Wip:            {}\n",
            if q.filter_wip { "only" } else { "exclude" }
        ));
    }
    if q.planned || q.non_planned {
        out.push_str(&format!(
            "Planned:        {}\n",
            if q.planned { "only" } else { "exclude" }
        ));
    }
    if !q.tags.is_empty() {
        let tags: Vec<&str> = q.tags.iter().map(|t| t.as_str()).collect();
        out.push_str(&format!("Tags (any):     {}\n", tags.join(", ")));
    }
    if !q.search_text.is_empty() {
        out.push_str(&format!("Search:         {}\n", q.search_text));
    }
    out.push_str(&format!(
        "Sort:           {} {}\n",
        q.sort_column.resolve(),
        if q.sort_direction.is_desc() { "desc" } else { "asc" }
    ));
    if q.enable_limit {
        out.push_str(&format!("Limit:          {}\n", q.limit_count));
    }
    out
}
