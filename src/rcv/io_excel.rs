use calamine::DataType;

use crate::rcv::{
    io_common::{get_col_index_mapping, make_default_id, parse_row, ColumnMapping, ParsedBallot},
    *,
};

pub fn read_excel_file(path: &str, cfs: &FileSource) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let wrange = get_range(path, cfs)?;

    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|dt| match dt {
            DataType::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    debug!("read_excel_file: header: {:?}", header);
    let mapping = get_col_index_mapping(path, cfs, &header)?;
    debug!("read_excel_file: mapping: {:?}", mapping);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The header is the first line of the file.
        let lineno = idx + 2;
        let cells = read_row(path, lineno, &mapping, row)?;
        let pb = parse_row(&mapping, &cells, default_id(lineno));
        debug!("read_excel_file: ballot: {:?}", pb);
        res.push(pb);
    }
    info!("read_excel_file: {}: {} ballots", path, res.len());
    Ok(res)
}

fn read_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Empty => Some("".to_string()),
        DataType::Int(i) => Some(i.to_string()),
        // Record numbers are sometimes stored as floats.
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts the cells of a row to text.
///
/// Only a ballot id that cannot be read is an error. Any other unreadable cell
/// is empty: a blank rank for the choice columns.
fn read_row(
    path: &str,
    lineno: usize,
    mapping: &ColumnMapping,
    row: &[DataType],
) -> RcvResult<Vec<String>> {
    let mut cells: Vec<String> = Vec::with_capacity(row.len());
    for (col, cell) in row.iter().enumerate() {
        let content = match read_cell(cell) {
            Some(s) => s,
            None if mapping.id == Some(col) => {
                return ExcelWrongCellTypeSnafu {
                    path,
                    lineno: lineno as u64,
                    content: format!("{:?}", cell),
                }
                .fail();
            }
            None => {
                if mapping.choices.contains(&col) {
                    warn!(
                        "{}, line {}: cell {:?} is not a choice, treated as blank",
                        path, lineno, cell
                    );
                }
                "".to_string()
            }
        };
        cells.push(content);
    }
    Ok(cells)
}

fn get_range(path: &str, cfs: &FileSource) -> RcvResult<calamine::Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let range = match &cfs.excel_worksheet_name {
        Some(worksheet) => workbook
            .worksheet_range(worksheet)
            .context(MissingWorksheetSnafu { path, worksheet })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    };
    range.context(OpeningExcelSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            id: Some(0),
            precinct: Some(1),
            ballot_style: None,
            choices: vec![2, 3],
        }
    }

    #[test]
    fn cells_are_read_as_text() {
        assert_eq!(read_cell(&DataType::Float(1042.0)), Some("1042".to_string()));
        assert_eq!(read_cell(&DataType::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(read_cell(&DataType::Int(7)), Some("7".to_string()));
        assert_eq!(read_cell(&DataType::Empty), Some("".to_string()));
        assert_eq!(
            read_cell(&DataType::String("Golden, Jared F.".to_string())),
            Some("Golden, Jared F.".to_string())
        );
        assert_eq!(read_cell(&DataType::Error(CellErrorType::NA)), None);
        assert_eq!(read_cell(&DataType::DateTime(43410.0)), None);
    }

    #[test]
    fn unreadable_choices_are_blank() {
        let row = vec![
            DataType::Float(12.0),
            DataType::DateTime(43410.0),
            DataType::Error(CellErrorType::Value),
            DataType::String("Bond, Tiffany L.".to_string()),
            DataType::Error(CellErrorType::Ref),
        ];
        let cells = read_row("cvr.xlsx", 3, &mapping(), &row).unwrap();
        assert_eq!(cells, vec!["12", "", "", "Bond, Tiffany L.", ""]);

        let pb = parse_row(&mapping(), &cells, "default".to_string());
        assert_eq!(pb.id, "12");
        assert_eq!(pb.precinct, None);
        assert_eq!(pb.choices, vec!["", "Bond, Tiffany L."]);
    }

    #[test]
    fn unreadable_id_is_an_error() {
        let row = vec![DataType::Error(CellErrorType::Div0), DataType::Empty];
        let res = read_row("cvr.xlsx", 5, &mapping(), &row);
        assert!(matches!(
            res,
            Err(RcvError::ExcelWrongCellType { lineno: 5, .. })
        ));
    }
}
